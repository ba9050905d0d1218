//! `\label`: static text or image.

use crate::widget::attributes::{BINDING_GROUP, POSITION_GROUP};
use crate::widget::{Factory, Schema};

use super::native::NativeWidget;

pub const KIND: &str = "label";

pub fn schema() -> Schema {
    Schema::new(KIND)
        .default("text", "")
        .text("text")
        .keys(&[
            "foreground",
            "background",
            "text_color",
            "padx",
            "pady",
            "font",
            "image",
            "compound",
        ])
        .groups(&[POSITION_GROUP, BINDING_GROUP])
}

pub fn factory() -> Factory {
    Factory::new(KIND, NativeWidget::build).with_schema(schema())
}
