//! Maps a field's data type to an input control, an encode/decode rule and a
//! display rule. Every function here is total over `DataType`; unknown types
//! behave like `string`.

pub mod checks;
pub mod display;
pub mod input;

pub use checks::validate_record_data;
pub use display::{is_truthy, search_text, EMPTY_GLYPH};
pub use input::{InputControl, InputError, InputEvent};

use serde_json::Value;

use crate::{schema::FieldDefinition, settings::DisplayOptions};

#[derive(Debug, Clone, Default)]
pub struct FieldRenderer {
    display: DisplayOptions,
}

impl FieldRenderer {
    pub fn new(display: DisplayOptions) -> Self {
        Self { display }
    }

    pub fn render_input(&self, field: &FieldDefinition, current: Option<&Value>) -> InputControl {
        input::render_input(field, current)
    }

    pub fn decode_input(
        &self,
        field: &FieldDefinition,
        event: InputEvent,
    ) -> Result<Value, InputError> {
        input::decode_input(field, event)
    }

    pub fn format_display(&self, value: Option<&Value>, field: &FieldDefinition) -> String {
        display::format_display(value, field, &self.display)
    }
}
