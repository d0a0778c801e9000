/// Progress reporting for layer rendering, consumed by the UI.
///
/// Resources are identified by the layer id plus a resource key (usually the
/// service URL, or the record id for catalogue renderings).
pub trait RenderStatus {
    fn reset_layer(&mut self, layer_id: &str);
    fn add_resource(&mut self, layer_id: &str, resource: &str);
    fn update_complete(&mut self, layer_id: &str, resource: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    Reset { layer: String },
    Added { layer: String, resource: String },
    Completed { layer: String, resource: String },
}

/// Records every call in order.
#[derive(Debug, Default, Clone)]
pub struct StatusLog {
    events: Vec<StatusEvent>,
}

impl StatusLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[StatusEvent] {
        &self.events
    }

    /// Resources added for `layer` that have not completed since its last reset.
    pub fn pending(&self, layer: &str) -> Vec<&str> {
        let mut pending: Vec<&str> = Vec::new();
        for event in &self.events {
            match event {
                StatusEvent::Reset { layer: l } if l == layer => pending.clear(),
                StatusEvent::Added { layer: l, resource } if l == layer => {
                    pending.push(resource.as_str())
                }
                StatusEvent::Completed { layer: l, resource } if l == layer => {
                    if let Some(i) = pending.iter().position(|r| *r == resource.as_str()) {
                        pending.remove(i);
                    }
                }
                _ => {}
            }
        }
        pending
    }
}

impl RenderStatus for StatusLog {
    fn reset_layer(&mut self, layer_id: &str) {
        self.events.push(StatusEvent::Reset {
            layer: layer_id.to_string(),
        });
    }

    fn add_resource(&mut self, layer_id: &str, resource: &str) {
        self.events.push(StatusEvent::Added {
            layer: layer_id.to_string(),
            resource: resource.to_string(),
        });
    }

    fn update_complete(&mut self, layer_id: &str, resource: &str) {
        self.events.push(StatusEvent::Completed {
            layer: layer_id.to_string(),
            resource: resource.to_string(),
        });
    }
}
