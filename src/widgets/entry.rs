//! `\entry`: single-line text input. `text` is written back on input.

use crate::value::Value;
use crate::widget::attributes::{BINDING_GROUP, POSITION_GROUP};
use crate::widget::{Factory, ResolvedAttributes, Schema, WidgetError};

use super::native::NativeWidget;

pub const KIND: &str = "entry";

pub fn schema() -> Schema {
    Schema::new(KIND)
        .default("text", "")
        .two_way("text")
        .keys(&["padx", "pady", "width", "font", "show"])
        .groups(&[POSITION_GROUP, BINDING_GROUP])
        .validate_with(validate)
}

/// `show` masks input with a single character.
fn validate(attributes: &ResolvedAttributes) -> Result<(), WidgetError> {
    match attributes.get("show") {
        None | Some(Value::None) => Ok(()),
        Some(Value::Str(s)) if s.chars().count() <= 1 => Ok(()),
        Some(_) => Err(WidgetError::invalid("show", "expected a single character")),
    }
}

pub fn factory() -> Factory {
    Factory::new(KIND, NativeWidget::build).with_schema(schema())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_two_way() {
        let s = schema();
        assert!(s.is_two_way("text"));
        assert!(s.validate(&ResolvedAttributes::new().with("show", "*")).is_ok());
        assert!(s.validate(&ResolvedAttributes::new().with("show", "**")).is_err());
    }
}
