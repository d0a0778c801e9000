use std::collections::BTreeMap;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RenderLayerKind {
    /// Server-rendered image (e.g. a WMS GetMap overlay).
    Image,
    /// Client-side vector source.
    Vector,
}

/// Description of one renderable layer handed to a [`crate::MapSurface`].
///
/// Source parameters are kept in a `BTreeMap` so request strings built from
/// them are stable.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderLayer {
    pub kind: RenderLayerKind,
    pub url: Option<String>,
    pub params: BTreeMap<String, String>,
    pub sld_body: Option<String>,
    pub visible: bool,
    pub opacity: f64,
}

impl RenderLayer {
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            kind: RenderLayerKind::Image,
            url: Some(url.into()),
            params: BTreeMap::new(),
            sld_body: None,
            visible: true,
            opacity: 1.0,
        }
    }

    pub fn vector() -> Self {
        Self {
            kind: RenderLayerKind::Vector,
            url: None,
            params: BTreeMap::new(),
            sld_body: None,
            visible: true,
            opacity: 1.0,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_sld_body(mut self, sld: impl Into<String>) -> Self {
        self.sld_body = Some(sld.into());
        self
    }

    pub fn is_vector(&self) -> bool {
        self.kind == RenderLayerKind::Vector
    }
}
