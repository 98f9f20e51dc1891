use serde::{Deserialize, Serialize};

pub const REQUIRED_FIELDS: [&str; 4] = ["name", "shipping_street", "commune", "phone"];

/// Shipping details collected by the shipping form.
///
/// Field names match the quote service wire format.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerData {
    pub name: String,
    pub shipping_street: String,
    pub commune: String,
    pub phone: String,
}

impl CustomerData {
    pub fn new(
        name: impl Into<String>,
        shipping_street: impl Into<String>,
        commune: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            shipping_street: shipping_street.into(),
            commune: commune.into(),
            phone: phone.into(),
        }
    }

    /// Required fields that are empty or whitespace-only, in form order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let values = [&self.name, &self.shipping_street, &self.commune, &self.phone];
        REQUIRED_FIELDS
            .iter()
            .zip(values)
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| *field)
            .collect()
    }

    pub fn trimmed(&self) -> Self {
        Self::new(
            self.name.trim(),
            self.shipping_street.trim(),
            self.commune.trim(),
            self.phone.trim(),
        )
    }
}
