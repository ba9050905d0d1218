//! `\button`: runs its `command` when pressed.

use crate::value::Value;
use crate::widget::attributes::{BINDING_GROUP, POSITION_GROUP};
use crate::widget::{Factory, ResolvedAttributes, Schema, WidgetError};

use super::native::NativeWidget;

pub const KIND: &str = "button";

pub fn schema() -> Schema {
    Schema::new(KIND)
        .default("text", "")
        .text("text")
        .keys(&[
            "command",
            "padx",
            "pady",
            "fg",
            "bg",
            "foreground",
            "background",
            "image",
            "compound",
        ])
        .groups(&[POSITION_GROUP, BINDING_GROUP])
        .validate_with(validate)
}

fn validate(attributes: &ResolvedAttributes) -> Result<(), WidgetError> {
    match attributes.get("command") {
        None | Some(Value::None | Value::Callable(_)) => Ok(()),
        Some(other) => Err(WidgetError::invalid(
            "command",
            format!("expected a callable, got {}", other.type_name()),
        )),
    }
}

pub fn factory() -> Factory {
    Factory::new(KIND, NativeWidget::build).with_schema(schema())
}
