//! Shipping address domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use niaga_customer_core::{AddressId, AddressLabel, CustomerId, Phone};

use super::{Defaultable, ValidationError, optional_text, required_text};

/// Country used when the request does not name one.
pub const DEFAULT_COUNTRY: &str = "Malaysia";

const MAX_NAME: usize = 255;
const MAX_LINE: usize = 255;
const MAX_CITY: usize = 100;
const MAX_POSTCODE: usize = 20;

/// A saved shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    pub id: AddressId,
    pub customer_id: CustomerId,
    pub label: AddressLabel,
    pub recipient_name: String,
    pub phone: Phone,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postcode: String,
    pub country: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Defaultable for Address {
    type Id = AddressId;

    const COLLECTION: &'static str = "addresses";
    const ITEM: &'static str = "address";

    fn id(&self) -> AddressId {
        self.id
    }

    fn owner(&self) -> CustomerId {
        self.customer_id
    }

    fn is_default(&self) -> bool {
        self.is_default
    }

    fn set_default(&mut self, is_default: bool) {
        self.is_default = is_default;
    }
}

/// Request body for creating an address.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressInput {
    #[serde(default)]
    pub label: AddressLabel,
    pub recipient_name: String,
    pub phone: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postcode: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl AddressInput {
    /// Validate the input into a new, non-default address owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if a required field is blank, too long, or
    /// the phone number is malformed.
    pub fn into_address(self, owner: CustomerId) -> Result<Address, ValidationError> {
        let now = Utc::now();
        let country = optional_text("country", self.country.as_deref(), MAX_CITY)?
            .unwrap_or_else(|| DEFAULT_COUNTRY.to_owned());

        Ok(Address {
            id: AddressId::generate(),
            customer_id: owner,
            label: self.label,
            recipient_name: required_text("recipient_name", &self.recipient_name, MAX_NAME)?,
            phone: Phone::parse(&self.phone)?,
            address_line1: required_text("address_line1", &self.address_line1, MAX_LINE)?,
            address_line2: optional_text("address_line2", self.address_line2.as_deref(), MAX_LINE)?,
            city: required_text("city", &self.city, MAX_CITY)?,
            state: required_text("state", &self.state, MAX_CITY)?,
            postcode: required_text("postcode", &self.postcode, MAX_POSTCODE)?,
            country,
            is_default: false,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Request body for a partial address update. Absent fields are unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressPatch {
    pub label: Option<AddressLabel>,
    pub recipient_name: Option<String>,
    pub phone: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
    pub is_default: Option<bool>,
}

impl AddressPatch {
    /// Apply the patch to `address`. The default flag is not touched here.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if a provided field is invalid; `address`
    /// is left unchanged in that case.
    pub fn apply(&self, address: &Address) -> Result<Address, ValidationError> {
        let mut next = address.clone();
        if let Some(label) = self.label {
            next.label = label;
        }
        if let Some(name) = &self.recipient_name {
            next.recipient_name = required_text("recipient_name", name, MAX_NAME)?;
        }
        if let Some(phone) = &self.phone {
            next.phone = Phone::parse(phone)?;
        }
        if let Some(line) = &self.address_line1 {
            next.address_line1 = required_text("address_line1", line, MAX_LINE)?;
        }
        if let Some(line) = &self.address_line2 {
            next.address_line2 = optional_text("address_line2", Some(line), MAX_LINE)?;
        }
        if let Some(city) = &self.city {
            next.city = required_text("city", city, MAX_CITY)?;
        }
        if let Some(state) = &self.state {
            next.state = required_text("state", state, MAX_CITY)?;
        }
        if let Some(postcode) = &self.postcode {
            next.postcode = required_text("postcode", postcode, MAX_POSTCODE)?;
        }
        if let Some(country) = &self.country {
            next.country = required_text("country", country, MAX_CITY)?;
        }
        next.updated_at = Utc::now();
        Ok(next)
    }
}
