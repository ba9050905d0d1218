//! `\checkbutton`: a toggle whose `checked` state is written back on input.

use crate::widget::attributes::{BINDING_GROUP, POSITION_GROUP};
use crate::widget::{Factory, Schema};

use super::native::NativeWidget;

pub const KIND: &str = "checkbutton";

pub fn schema() -> Schema {
    Schema::new(KIND)
        .default("checked", false)
        .two_way("checked")
        .text("text")
        .keys(&["command"])
        .groups(&[POSITION_GROUP, BINDING_GROUP])
}

pub fn factory() -> Factory {
    Factory::new(KIND, NativeWidget::build).with_schema(schema())
}
