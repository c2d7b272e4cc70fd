use crate::models::{DevicePatch, DeviceStatus};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Attributes of a device that an update may touch.
///
/// This is the complete allow-list: `mac` is the key and `owner` is fixed at
/// registration, neither can ever appear in an [`UpdateExpression`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DeviceField {
    Name,
    Status,
}

impl DeviceField {
    pub const ALL: [DeviceField; 2] = [DeviceField::Name, DeviceField::Status];

    /// column name in the `devices` table
    pub fn attribute(self) -> &'static str {
        match self {
            DeviceField::Name => "name",
            DeviceField::Status => "status",
        }
    }
    fn name_placeholder(self) -> &'static str {
        match self {
            DeviceField::Name => "#name",
            DeviceField::Status => "#status",
        }
    }
    fn value_placeholder(self) -> &'static str {
        match self {
            DeviceField::Name => ":name",
            DeviceField::Status => ":status",
        }
    }
    fn extract(self, patch: &DevicePatch) -> Option<AttributeValue> {
        match self {
            DeviceField::Name => patch.name.clone().map(AttributeValue::Text),
            DeviceField::Status => patch.status.map(AttributeValue::Status),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Text(String),
    Status(DeviceStatus),
}

impl Display for AttributeValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeValue::Text(text) => write!(f, "{text:?}"),
            AttributeValue::Status(status) => write!(f, "{status}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Assignment {
    name: &'static str,
    value: &'static str,
}

/// A partial update over the [`DeviceField`] allow-list.
///
/// Assignments only reference placeholders; the real attribute names and the
/// user supplied values live in two separate maps, so no request value is ever
/// spliced into statement text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateExpression {
    assignments: Vec<Assignment>,
    names: BTreeMap<&'static str, DeviceField>,
    values: BTreeMap<&'static str, AttributeValue>,
}

impl UpdateExpression {
    pub fn build(patch: &DevicePatch) -> Self {
        let mut expression = Self::default();
        for field in DeviceField::ALL {
            let Some(value) = field.extract(patch) else {
                continue;
            };
            let assignment = Assignment {
                name: field.name_placeholder(),
                value: field.value_placeholder(),
            };
            expression.names.insert(assignment.name, field);
            expression.values.insert(assignment.value, value);
            expression.assignments.push(assignment);
        }
        expression
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Resolved `(field, value)` pairs in allow-list order.
    pub fn assignments(&self) -> impl Iterator<Item = (DeviceField, &AttributeValue)> + '_ {
        self.assignments.iter().filter_map(|assignment| {
            let field = self.names.get(assignment.name)?;
            let value = self.values.get(assignment.value)?;
            Some((*field, value))
        })
    }

    pub fn fields(&self) -> Vec<DeviceField> {
        self.assignments().map(|(field, _)| field).collect()
    }
}

impl Display for UpdateExpression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("SET")?;
        for (i, assignment) in self.assignments.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{} = {}", assignment.name, assignment.value)?;
        }
        Ok(())
    }
}
