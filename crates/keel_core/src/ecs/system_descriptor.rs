/// One column binding requested by a system: which fields of which
/// component the callback will touch, under what alias.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct FieldBinding {
    pub(crate) alias: String,
    pub(crate) component: String,
    pub(crate) fields: Vec<String>,
}

/// Declares what a system needs before it is registered: a unique name,
/// the component signature it matches on, and the column bindings exposed
/// through its [`EntityProxy`](crate::ecs::EntityProxy).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SystemDescriptor {
    name: String,
    signature: Vec<String>,
    bindings: Vec<FieldBinding>,
}

impl SystemDescriptor {
    /// Create a new descriptor with the provided name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            signature: Vec::new(),
            bindings: Vec::new(),
        }
    }

    /// Require a component without binding any of its columns.
    pub fn requires(mut self, component: impl Into<String>) -> Self {
        let component = component.into();
        if !self.signature.contains(&component) {
            self.signature.push(component);
        }
        self
    }

    /// Require a component and bind a selection of its field columns under
    /// `alias`. The proxy exposes each as `"<alias>.<field>"`.
    pub fn binds(
        mut self,
        alias: impl Into<String>,
        component: impl Into<String>,
        fields: &[&str],
    ) -> Self {
        let component = component.into();
        if !self.signature.contains(&component) {
            self.signature.push(component.clone());
        }
        self.bindings.push(FieldBinding {
            alias: alias.into(),
            component,
            fields: fields.iter().map(|f| f.to_string()).collect(),
        });
        self
    }

    /// Unique system name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Component signature in declaration order.
    pub fn signature(&self) -> &[String] {
        &self.signature
    }

    pub(crate) fn bindings(&self) -> &[FieldBinding] {
        &self.bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_builder() {
        let desc = SystemDescriptor::new("movement")
            .binds("pos", "Transform", &["x", "y"])
            .binds("vel", "Velocity", &["dx", "dy"])
            .requires("Active");
        assert_eq!(desc.name(), "movement");
        assert_eq!(desc.signature(), &["Transform", "Velocity", "Active"]);
        assert_eq!(desc.bindings().len(), 2);
        assert_eq!(desc.bindings()[0].alias, "pos");
        assert_eq!(desc.bindings()[1].fields, vec!["dx", "dy"]);
    }

    #[test]
    fn test_binding_implies_signature_membership_once() {
        let desc = SystemDescriptor::new("s")
            .requires("Transform")
            .binds("pos", "Transform", &["x"]);
        assert_eq!(desc.signature(), &["Transform"]);
    }
}
