//! `\frame`: a container laying out its children.

use crate::widget::attributes::{BINDING_GROUP, POSITION_GROUP, WEIGHT_GROUP};
use crate::widget::{Factory, Schema};

use super::native::NativeWidget;

pub const KIND: &str = "frame";

pub fn schema() -> Schema {
    Schema::new(KIND)
        .keys(&["padding", "borderwidth", "relief", "width", "height", "bootstyle", "text"])
        .groups(&[POSITION_GROUP, WEIGHT_GROUP, BINDING_GROUP])
        .with_children()
}

pub fn factory() -> Factory {
    Factory::new(KIND, NativeWidget::build).with_schema(schema())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::ResolvedAttributes;

    #[test]
    fn test_frame_accepts_layout_groups() {
        let s = schema();
        assert!(s.accepts_children());
        assert!(s.accepts("weight:x"));
        assert!(s.accepts("pos:grid"));
        assert!(!s.accepts("command"));

        let bad = ResolvedAttributes::new().with("weight:x", "0-1");
        assert!(s.validate(&bad).is_err());
    }
}
