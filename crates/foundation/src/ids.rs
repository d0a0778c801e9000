/// Handle of a renderable layer attached to a map surface.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RenderLayerId(pub u64);

/// Handle of a vector feature held by a render layer's source.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureId(pub u64);

/// Monotonic id source. Ids are never reused, so a handle that outlives its
/// layer can't alias a newer one.
#[derive(Debug, Default, Clone)]
pub struct IdSequence {
    next: u64,
}

impl IdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_raw(&mut self) -> u64 {
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        id
    }

    pub fn next_layer(&mut self) -> RenderLayerId {
        RenderLayerId(self.next_raw())
    }

    pub fn next_feature(&mut self) -> FeatureId {
        FeatureId(self.next_raw())
    }
}
