//! Form validation.
//!
//! Every form the dashboard submits is checked here before anything touches the database. Failures are collected
//! per field into a [`FormErrors`] value rather than stopping at the first problem, so that the client can highlight
//! all the offending inputs at once.
//!
//! Numeric inputs arrive either as JSON numbers or as the strings an HTML form produces, so they are accepted as
//! loose [`Value`]s and parsed here.
use std::{collections::BTreeMap, fmt::Display};

use regex::Regex;
use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::db_types::{
    NewMenu,
    NewOrder,
    NewTable,
    OrderStatusType,
    Role,
    Rupiah,
    TableStatus,
    TABLE_CAPACITIES,
};

/// Key under which errors that do not belong to a single field are reported.
pub const FORM_FIELD: &str = "_form";

pub const MIN_PASSWORD_LEN: usize = 6;
const MAX_NAME_LEN: usize = 200;
const MAX_NOTE_LEN: usize = 500;
/// Most units of one menu that a single line may order.
pub const MAX_QUANTITY: i64 = 1_000;
/// Highest price a menu may carry, in Rupiah.
pub const MAX_PRICE: i64 = 1_000_000_000_000;
const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

//--------------------------------------      FormErrors       ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// A result with a single form-level message.
    pub fn form<S: Display>(message: S) -> Self {
        let mut errors = Self::new();
        errors.add(FORM_FIELD, message);
        errors
    }

    pub fn add<S: Display>(&mut self, field: &str, message: S) {
        self.errors.entry(field.to_string()).or_default().push(message.to_string());
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.errors.get(field).map(|v| v.as_slice()).unwrap_or_default()
    }

    pub fn has(&self, field: &str) -> bool {
        !self.field(field).is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.errors
    }

    /// Returns `value` if no errors were recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl Display for FormErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages = self.errors.values().flatten().map(String::as_str).collect::<Vec<&str>>().join("; ");
        f.write_str(&messages)
    }
}

impl std::error::Error for FormErrors {}

impl Serialize for FormErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("status", "error")?;
        map.serialize_entry("errors", &self.errors)?;
        map.end()
    }
}

//--------------------------------------     Field helpers     ---------------------------------------------------------
fn required_text(errors: &mut FormErrors, field: &str, value: &str, message: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, message);
    } else if value.chars().count() > MAX_NAME_LEN {
        errors.add(field, format!("Must be at most {MAX_NAME_LEN} characters"));
    }
    value.to_string()
}

fn optional_text(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Parses a loosely typed numeric input. `Ok(None)` means the field was left empty.
pub fn parse_integer(value: &Option<Value>) -> Result<Option<i64>, ()> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(v) => Ok(Some(v)),
            #[allow(clippy::cast_possible_truncation)]
            None => n.as_f64().filter(|f| f.fract() == 0.0).map(|f| Some(f as i64)).ok_or(()),
        },
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s.trim().parse::<i64>().map(Some).map_err(|_| ()),
        Some(_) => Err(()),
    }
}

pub fn is_valid_email(email: &str) -> bool {
    Regex::new(EMAIL_PATTERN).map(|re| re.is_match(email)).unwrap_or(false)
}

fn check_email(errors: &mut FormErrors, email: &str) -> String {
    let email = email.trim();
    if email.is_empty() {
        errors.add("email", "Email is required");
    } else if !is_valid_email(email) {
        errors.add("email", "Please enter a valid email");
    }
    email.to_ascii_lowercase()
}

fn check_password(errors: &mut FormErrors, password: &str) {
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add("password", format!("Password must be at least {MIN_PASSWORD_LEN} characters"));
    }
}

//--------------------------------------         Login         ---------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    pub fn new<S: Into<String>>(email: S, password: S) -> Self {
        Self { email: email.into(), password: password.into() }
    }

    /// Returns the normalised email address.
    pub fn validate(&self) -> Result<String, FormErrors> {
        let mut errors = FormErrors::new();
        let email = check_email(&mut errors, &self.email);
        check_password(&mut errors, &self.password);
        errors.into_result(email)
    }
}

//--------------------------------------        NewUser        ---------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewUserForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// A user form that has passed validation. The password is still in the clear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidUser {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
    pub avatar_url: Option<String>,
}

impl NewUserForm {
    pub fn validate(self) -> Result<ValidUser, FormErrors> {
        let mut errors = FormErrors::new();
        let email = check_email(&mut errors, &self.email);
        check_password(&mut errors, &self.password);
        let name = required_text(&mut errors, "name", &self.name, "Name is required");
        let role = self.role.parse::<Role>().map_err(|_| errors.add("role", "Select a valid role")).ok();
        match role {
            Some(role) => errors.into_result(ValidUser {
                email,
                password: self.password,
                name,
                role,
                avatar_url: optional_text(self.avatar_url),
            }),
            None => Err(errors),
        }
    }
}

//--------------------------------------        Orders         ---------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DineInOrderForm {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub table_id: Option<Value>,
    #[serde(default)]
    pub status: String,
}

impl DineInOrderForm {
    pub fn validate(self) -> Result<NewOrder, FormErrors> {
        let mut errors = FormErrors::new();
        let customer_name =
            required_text(&mut errors, "customer_name", &self.customer_name, "Customer name is required");
        let table_id = match parse_integer(&self.table_id) {
            Ok(Some(id)) if id > 0 => Some(id),
            _ => {
                errors.add("table_id", "Select a table");
                None
            },
        };
        let status = match self.status.parse::<OrderStatusType>() {
            Ok(s @ (OrderStatusType::Reserved | OrderStatusType::Process)) => Some(s),
            _ => {
                errors.add("status", "Select a valid status");
                None
            },
        };
        match (table_id, status) {
            (Some(table_id), Some(status)) => {
                errors.into_result(NewOrder::dine_in(customer_name, table_id, status))
            },
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TakeawayOrderForm {
    #[serde(default)]
    pub customer_name: String,
}

impl TakeawayOrderForm {
    pub fn validate(self) -> Result<NewOrder, FormErrors> {
        let mut errors = FormErrors::new();
        let customer_name =
            required_text(&mut errors, "customer_name", &self.customer_name, "Customer name is required");
        errors.into_result(NewOrder::takeaway(customer_name))
    }
}

/// Checks the lines submitted to an order before any menu is looked up.
pub fn validate_cart_lines(lines: &[crate::pricing::CartLine]) -> Result<(), FormErrors> {
    let mut errors = FormErrors::new();
    if lines.is_empty() {
        errors.add(FORM_FIELD, "Add at least one item to the order");
    }
    if lines.iter().any(|l| l.quantity < 1) {
        errors.add("quantity", "Quantity must be at least 1");
    }
    if lines.iter().any(|l| l.quantity > MAX_QUANTITY) {
        errors.add("quantity", format!("Quantity must be at most {MAX_QUANTITY}"));
    }
    if lines.iter().filter_map(|l| l.notes.as_ref()).any(|n| n.chars().count() > MAX_NOTE_LEN) {
        errors.add("notes", format!("Notes must be at most {MAX_NOTE_LEN} characters"));
    }
    errors.into_result(())
}

//--------------------------------------         Menus         ---------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub discount: Option<Value>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_available: Option<bool>,
}

impl MenuForm {
    pub fn validate(self) -> Result<NewMenu, FormErrors> {
        let mut errors = FormErrors::new();
        let name = required_text(&mut errors, "name", &self.name, "Name is required");
        let description = required_text(&mut errors, "description", &self.description, "Description is required");
        let category = required_text(&mut errors, "category", &self.category, "Category is required");
        let price = match parse_integer(&self.price) {
            Ok(Some(p)) if (0..=MAX_PRICE).contains(&p) => p,
            Ok(Some(p)) if p < 0 => {
                errors.add("price", "Price cannot be negative");
                0
            },
            Ok(Some(_)) => {
                errors.add("price", format!("Price must be at most {}", Rupiah::from(MAX_PRICE)));
                0
            },
            Ok(None) => {
                errors.add("price", "Price is required");
                0
            },
            Err(()) => {
                errors.add("price", "Price must be a number");
                0
            },
        };
        let discount = match parse_integer(&self.discount) {
            Ok(Some(d)) if (0..=100).contains(&d) => d,
            Ok(Some(_)) => {
                errors.add("discount", "Discount must be between 0 and 100");
                0
            },
            Ok(None) => 0,
            Err(()) => {
                errors.add("discount", "Discount must be a number");
                0
            },
        };
        errors.into_result(NewMenu {
            name,
            description,
            price: Rupiah::from(price),
            discount,
            category,
            image_url: optional_text(self.image_url),
            is_available: self.is_available.unwrap_or(true),
        })
    }
}

//--------------------------------------        Tables         ---------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub capacity: Option<Value>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub position_x: Option<f64>,
    #[serde(default)]
    pub position_y: Option<f64>,
}

impl TableForm {
    pub fn validate(self) -> Result<NewTable, FormErrors> {
        let mut errors = FormErrors::new();
        let name = required_text(&mut errors, "name", &self.name, "Name is required");
        let capacity = match parse_integer(&self.capacity) {
            Ok(Some(c)) if TABLE_CAPACITIES.contains(&c) => c,
            _ => {
                errors.add("capacity", "Capacity must be one of 2, 4, 6, 8 or 10");
                0
            },
        };
        let status = match self.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => TableStatus::Available,
            Some(s) => s.parse::<TableStatus>().unwrap_or_else(|_| {
                errors.add("status", "Select a valid status");
                TableStatus::Available
            }),
        };
        errors.into_result(NewTable {
            name,
            description: optional_text(self.description),
            capacity,
            status,
            position_x: round_coordinate(self.position_x.unwrap_or_default()),
            position_y: round_coordinate(self.position_y.unwrap_or_default()),
        })
    }
}

/// Floor plan coordinates are stored as whole pixels.
#[allow(clippy::cast_possible_truncation)]
pub fn round_coordinate(v: f64) -> i64 {
    if v.is_finite() {
        v.round() as i64
    } else {
        0
    }
}
