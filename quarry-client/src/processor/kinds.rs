//! Typed processor kinds.
//!
//! Every field is optional so that a partially configured processor encodes
//! only what was set.

use super::ProcessorCommon;
use crate::field::Field;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Keep an explicit JSON `null` distinct from an absent value.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

macro_rules! case_processor {
    ($(#[$meta:meta])* $ty:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct $ty {
            /// Field to transform.
            #[serde(skip_serializing_if = "Option::is_none")]
            pub field: Option<Field>,
            /// Field to write the result to; defaults to `field`.
            #[serde(skip_serializing_if = "Option::is_none")]
            pub target_field: Option<Field>,
            /// Succeed silently when `field` is missing.
            #[serde(skip_serializing_if = "Option::is_none")]
            pub ignore_missing: Option<bool>,
            /// Common options.
            #[serde(flatten)]
            pub common: ProcessorCommon,
        }

        impl $ty {
            /// Set the source field.
            pub fn field(mut self, field: impl Into<Field>) -> Self {
                self.field = Some(field.into());
                self
            }

            /// Set the target field.
            pub fn target_field(mut self, field: impl Into<Field>) -> Self {
                self.target_field = Some(field.into());
                self
            }

            /// Set `ignore_missing`.
            pub fn ignore_missing(mut self, ignore: bool) -> Self {
                self.ignore_missing = Some(ignore);
                self
            }
        }
    };
}

case_processor! {
    /// Converts a string field to upper case.
    UppercaseProcessor
}

case_processor! {
    /// Converts a string field to lower case.
    LowercaseProcessor
}

case_processor! {
    /// Strips surrounding whitespace from a string field.
    TrimProcessor
}

/// Sets a field to a value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetProcessor {
    /// Field to set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<Field>,
    /// Value to set; `Some(Value::Null)` sets an explicit null.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Value>,
    /// Whether to replace an existing non-null value.
    #[serde(rename = "override", skip_serializing_if = "Option::is_none")]
    pub override_existing: Option<bool>,
    /// Common options.
    #[serde(flatten)]
    pub common: ProcessorCommon,
}

impl SetProcessor {
    /// Set the target field.
    pub fn field(mut self, field: impl Into<Field>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Set the value.
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set `override`.
    pub fn override_existing(mut self, override_existing: bool) -> Self {
        self.override_existing = Some(override_existing);
        self
    }
}

/// Renames a field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenameProcessor {
    /// Field to rename.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<Field>,
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_field: Option<Field>,
    /// Succeed silently when `field` is missing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_missing: Option<bool>,
    /// Common options.
    #[serde(flatten)]
    pub common: ProcessorCommon,
}

impl RenameProcessor {
    /// Set the field to rename.
    pub fn field(mut self, field: impl Into<Field>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Set the new name.
    pub fn target_field(mut self, field: impl Into<Field>) -> Self {
        self.target_field = Some(field.into());
        self
    }

    /// Set `ignore_missing`.
    pub fn ignore_missing(mut self, ignore: bool) -> Self {
        self.ignore_missing = Some(ignore);
        self
    }
}

/// One field or several; a single field is written as a plain string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(Field),
    Many(Vec<Field>),
}

mod field_list {
    use super::OneOrMany;
    use crate::field::Field;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        fields: &Option<Vec<Field>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match fields.as_deref() {
            Some([single]) => single.serialize(serializer),
            Some(many) => many.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<Field>>, D::Error> {
        Ok(match OneOrMany::deserialize(deserializer)? {
            OneOrMany::One(field) => Some(vec![field]),
            OneOrMany::Many(fields) => Some(fields),
        })
    }
}

/// Removes one or more fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoveProcessor {
    /// Fields to remove.
    #[serde(
        default,
        with = "field_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub field: Option<Vec<Field>>,
    /// Succeed silently when a field is missing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_missing: Option<bool>,
    /// Common options.
    #[serde(flatten)]
    pub common: ProcessorCommon,
}

impl RemoveProcessor {
    /// Replace the fields to remove with a single field.
    pub fn field(mut self, field: impl Into<Field>) -> Self {
        self.field = Some(vec![field.into()]);
        self
    }

    /// Replace the fields to remove.
    pub fn fields<I, F>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Field>,
    {
        self.field = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Set `ignore_missing`.
    pub fn ignore_missing(mut self, ignore: bool) -> Self {
        self.ignore_missing = Some(ignore);
        self
    }
}

/// Appends values to an array field, creating it if needed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppendProcessor {
    /// Array field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<Field>,
    /// Value or array of values to append.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Value>,
    /// Whether values already present are appended again.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_duplicates: Option<bool>,
    /// Common options.
    #[serde(flatten)]
    pub common: ProcessorCommon,
}

impl AppendProcessor {
    /// Set the array field.
    pub fn field(mut self, field: impl Into<Field>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Set the value.
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set `allow_duplicates`.
    pub fn allow_duplicates(mut self, allow: bool) -> Self {
        self.allow_duplicates = Some(allow);
        self
    }
}

/// Target type of a [`ConvertProcessor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConvertType {
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    Long,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    /// String.
    String,
    /// Boolean.
    Boolean,
    /// IP address.
    Ip,
    /// Guess from the value.
    Auto,
}

/// Converts a field to another type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConvertProcessor {
    /// Field to convert.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<Field>,
    /// Target type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub convert_type: Option<ConvertType>,
    /// Field to write the result to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_field: Option<Field>,
    /// Succeed silently when `field` is missing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_missing: Option<bool>,
    /// Common options.
    #[serde(flatten)]
    pub common: ProcessorCommon,
}

impl ConvertProcessor {
    /// Set the field to convert.
    pub fn field(mut self, field: impl Into<Field>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Set the target type.
    pub fn convert_type(mut self, convert_type: ConvertType) -> Self {
        self.convert_type = Some(convert_type);
        self
    }

    /// Set the target field.
    pub fn target_field(mut self, field: impl Into<Field>) -> Self {
        self.target_field = Some(field.into());
        self
    }

    /// Set `ignore_missing`.
    pub fn ignore_missing(mut self, ignore: bool) -> Self {
        self.ignore_missing = Some(ignore);
        self
    }
}

/// Splits a string field into an array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitProcessor {
    /// Field to split.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<Field>,
    /// Separator regex.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
    /// Field to write the array to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_field: Option<Field>,
    /// Succeed silently when `field` is missing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_missing: Option<bool>,
    /// Keep trailing empty elements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preserve_trailing: Option<bool>,
    /// Common options.
    #[serde(flatten)]
    pub common: ProcessorCommon,
}

impl SplitProcessor {
    /// Set the field to split.
    pub fn field(mut self, field: impl Into<Field>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Set the separator.
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }

    /// Set the target field.
    pub fn target_field(mut self, field: impl Into<Field>) -> Self {
        self.target_field = Some(field.into());
        self
    }

    /// Set `ignore_missing`.
    pub fn ignore_missing(mut self, ignore: bool) -> Self {
        self.ignore_missing = Some(ignore);
        self
    }

    /// Set `preserve_trailing`.
    pub fn preserve_trailing(mut self, preserve: bool) -> Self {
        self.preserve_trailing = Some(preserve);
        self
    }
}

/// Joins an array field into a string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JoinProcessor {
    /// Array field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<Field>,
    /// Separator between elements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
    /// Field to write the string to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_field: Option<Field>,
    /// Common options.
    #[serde(flatten)]
    pub common: ProcessorCommon,
}

impl JoinProcessor {
    /// Set the array field.
    pub fn field(mut self, field: impl Into<Field>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Set the separator.
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }

    /// Set the target field.
    pub fn target_field(mut self, field: impl Into<Field>) -> Self {
        self.target_field = Some(field.into());
        self
    }
}

/// Replaces regex matches in a string field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GsubProcessor {
    /// Field to rewrite.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<Field>,
    /// Pattern to replace.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Replacement text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
    /// Field to write the result to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_field: Option<Field>,
    /// Succeed silently when `field` is missing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_missing: Option<bool>,
    /// Common options.
    #[serde(flatten)]
    pub common: ProcessorCommon,
}

impl GsubProcessor {
    /// Set the field to rewrite.
    pub fn field(mut self, field: impl Into<Field>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Set the pattern.
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Set the replacement.
    pub fn replacement(mut self, replacement: impl Into<String>) -> Self {
        self.replacement = Some(replacement.into());
        self
    }

    /// Set the target field.
    pub fn target_field(mut self, field: impl Into<Field>) -> Self {
        self.target_field = Some(field.into());
        self
    }

    /// Set `ignore_missing`.
    pub fn ignore_missing(mut self, ignore: bool) -> Self {
        self.ignore_missing = Some(ignore);
        self
    }
}

/// Parses a date field into a timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateProcessor {
    /// Field holding the date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<Field>,
    /// Accepted formats, tried in order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formats: Option<Vec<String>>,
    /// Field to write the timestamp to; defaults to `@timestamp`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_field: Option<Field>,
    /// Timezone applied when the date has none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    /// Locale for month and weekday names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// Common options.
    #[serde(flatten)]
    pub common: ProcessorCommon,
}

impl DateProcessor {
    /// Set the date field.
    pub fn field(mut self, field: impl Into<Field>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Replace the accepted formats.
    pub fn formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.formats = Some(formats.into_iter().map(Into::into).collect());
        self
    }

    /// Set the target field.
    pub fn target_field(mut self, field: impl Into<Field>) -> Self {
        self.target_field = Some(field.into());
        self
    }

    /// Set the timezone.
    pub fn timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    /// Set the locale.
    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }
}

/// Fails the pipeline with a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FailProcessor {
    /// Error message; may use templates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Common options.
    #[serde(flatten)]
    pub common: ProcessorCommon,
}

impl FailProcessor {
    /// Set the message.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
