//! Request bodies and the checks that turn them into domain values.
//!
//! Order checks fail fast on the first problem. Registration, login and
//! product checks collect every failing field.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use url::Url;
use utoipa::ToSchema;

use crate::{
    app_error::{AppError, FieldError},
    domain::{Category, NewProduct, PaymentMethod, ShippingAddress},
    money::Money,
};

pub const MAX_QUANTITY_PER_LINE: i64 = 100;
pub const MAX_PRODUCT_PRICE: Money = Money::from_cents(1_000_000_000);
/// Largest unit price an order line can store (`NUMERIC(10, 2)`).
pub const MAX_LINE_PRICE: Money = Money::from_cents(9_999_999_999);
/// Largest order total the orders table can store (`NUMERIC(12, 2)`).
pub const MAX_ORDER_TOTAL: Money = Money::from_cents(999_999_999_999);
pub const MAX_PRODUCT_STOCK: i64 = 1_000_000;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));
static PERSON_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z\s]+$").expect("name pattern compiles"));

// Orders

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput {
    pub order_items: Option<Vec<OrderItemInput>>,
    pub shipping_address: Option<AddressInput>,
    pub payment_method: Option<String>,
    /// Total the client computed; checked against the server total when present.
    #[schema(value_type = Option<String>, example = "2198.00")]
    pub total_price: Option<Money>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub product_id: i32,
    pub quantity: i64,
    #[schema(value_type = Option<String>, example = "499.00")]
    pub price: Option<Money>,
    /// Display fields sent by the storefront. Not stored: order reads join
    /// the product row for its current name and image.
    pub name: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedLine {
    pub product_id: i32,
    pub quantity: i32,
    pub price: Option<Money>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedOrder {
    pub lines: Vec<ValidatedLine>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub claimed_total: Option<Money>,
}

fn required_field(value: Option<&String>, name: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::Validation(format!("Shipping address must include {name}")))
}

pub fn validate_order(input: &OrderInput) -> Result<ValidatedOrder, AppError> {
    let items = input.order_items.as_deref().unwrap_or_default();
    if items.is_empty() {
        return Err(AppError::Validation("No order items".into()));
    }

    let mut lines = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        if item.quantity < 1 {
            return Err(AppError::Validation(format!(
                "orderItems[{index}].quantity must be at least 1"
            )));
        }
        if item.quantity > MAX_QUANTITY_PER_LINE {
            return Err(AppError::Validation(format!(
                "orderItems[{index}].quantity cannot exceed {MAX_QUANTITY_PER_LINE} per item"
            )));
        }
        if item.price.is_some_and(Money::is_negative) {
            return Err(AppError::Validation(format!(
                "orderItems[{index}].price cannot be negative"
            )));
        }
        if item.price.is_some_and(|price| price > MAX_LINE_PRICE) {
            return Err(AppError::Validation(format!(
                "orderItems[{index}].price cannot exceed {MAX_LINE_PRICE}"
            )));
        }
        lines.push(ValidatedLine {
            product_id: item.product_id,
            // bounded by MAX_QUANTITY_PER_LINE above
            quantity: item.quantity as i32,
            price: item.price,
        });
    }

    let address = input
        .shipping_address
        .as_ref()
        .ok_or_else(|| AppError::Validation("Shipping address is required".into()))?;
    let shipping_address = ShippingAddress {
        address: required_field(address.address.as_ref(), "address")?,
        city: required_field(address.city.as_ref(), "city")?,
        postal_code: required_field(address.postal_code.as_ref(), "postalCode")?,
        country: required_field(address.country.as_ref(), "country")?,
    };

    let payment_method = input
        .payment_method
        .as_deref()
        .ok_or_else(|| AppError::Validation("Payment method is required".into()))?
        .parse::<PaymentMethod>()
        .map_err(AppError::Validation)?;

    Ok(ValidatedOrder {
        lines,
        shipping_address,
        payment_method,
        claimed_total: input.total_price,
    })
}

// Accounts

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RegistrationInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

fn check_email(email: Option<&str>, errors: &mut Vec<FieldError>) -> String {
    let email = email.map(str::trim).unwrap_or_default();
    if email.is_empty() {
        errors.push(FieldError::new("email", "Email is required"));
    } else if !EMAIL.is_match(email) {
        errors.push(FieldError::new("email", "Please provide a valid email address"));
    }
    email.to_lowercase()
}

pub fn validate_registration(input: &RegistrationInput) -> Result<Registration, AppError> {
    let mut errors = Vec::new();

    let name = input.name.as_deref().map(str::trim).unwrap_or_default();
    let name_len = name.chars().count();
    if name.is_empty() {
        errors.push(FieldError::new("name", "Name is required"));
    } else if name_len < 2 {
        errors.push(FieldError::new("name", "Name must be at least 2 characters long"));
    } else if name_len > 50 {
        errors.push(FieldError::new("name", "Name must be less than 50 characters"));
    } else if !PERSON_NAME.is_match(name) {
        errors.push(FieldError::new("name", "Name can only contain letters and spaces"));
    }

    let email = check_email(input.email.as_deref(), &mut errors);
    if email.chars().count() > 100 {
        errors.push(FieldError::new("email", "Email must be less than 100 characters"));
    }

    let password = input.password.as_deref().unwrap_or_default();
    let password_len = password.chars().count();
    if password.is_empty() {
        errors.push(FieldError::new("password", "Password is required"));
    } else if password_len < 6 {
        errors.push(FieldError::new("password", "Password must be at least 6 characters long"));
    } else if password_len > 128 {
        errors.push(FieldError::new("password", "Password must be less than 128 characters"));
    } else if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        errors.push(FieldError::new("password", "Password must contain at least one letter"));
    }

    if !errors.is_empty() {
        return Err(AppError::ValidationFields(errors));
    }
    Ok(Registration {
        name: name.to_string(),
        email,
        password: password.to_string(),
    })
}

pub fn validate_login(input: &LoginInput) -> Result<Credentials, AppError> {
    let mut errors = Vec::new();
    let email = check_email(input.email.as_deref(), &mut errors);
    let password = input.password.as_deref().unwrap_or_default();
    if password.is_empty() {
        errors.push(FieldError::new("password", "Password is required"));
    }

    if !errors.is_empty() {
        return Err(AppError::ValidationFields(errors));
    }
    Ok(Credentials {
        email,
        password: password.to_string(),
    })
}

// Products

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, example = "499.00")]
    pub price: Option<Money>,
    pub category: Option<String>,
    pub stock: Option<i64>,
    pub image: Option<String>,
    pub image_alt: Option<String>,
}

pub fn validate_product(input: ProductInput) -> Result<NewProduct, AppError> {
    let mut errors = Vec::new();

    let name = input.name.as_deref().map(str::trim).unwrap_or_default().to_string();
    let name_len = name.chars().count();
    if name.is_empty() {
        errors.push(FieldError::new("name", "Product name is required"));
    } else if name_len < 2 {
        errors.push(FieldError::new("name", "Product name must be at least 2 characters long"));
    } else if name_len > 200 {
        errors.push(FieldError::new("name", "Product name must be less than 200 characters"));
    }

    let description = input.description.as_deref().map(str::trim).unwrap_or_default().to_string();
    if description.chars().count() > 1000 {
        errors.push(FieldError::new("description", "Description must be less than 1000 characters"));
    }

    let price = match input.price {
        None => {
            errors.push(FieldError::new("price", "Price is required"));
            Money::ZERO
        }
        Some(price) if price.is_negative() => {
            errors.push(FieldError::new("price", "Price must be a valid positive number"));
            price
        }
        Some(price) if price > MAX_PRODUCT_PRICE => {
            errors.push(FieldError::new("price", format!("Price cannot exceed {MAX_PRODUCT_PRICE}")));
            price
        }
        Some(price) => price,
    };

    let category = match input.category.as_deref().map(str::parse::<Category>) {
        Some(Ok(category)) => Some(category),
        Some(Err(message)) => {
            errors.push(FieldError::new("category", message));
            None
        }
        None => {
            errors.push(FieldError::new("category", "Category is required"));
            None
        }
    };

    let stock = input.stock.unwrap_or(0);
    if !(0..=MAX_PRODUCT_STOCK).contains(&stock) {
        errors.push(FieldError::new(
            "stock",
            format!("Stock must be between 0 and {MAX_PRODUCT_STOCK}"),
        ));
    }

    let image = input.image.unwrap_or_default();
    if !image.is_empty() && Url::parse(&image).is_err() {
        errors.push(FieldError::new("image", "Image must be a valid URL"));
    }

    match category {
        Some(category) if errors.is_empty() => Ok(NewProduct {
            image_alt: input
                .image_alt
                .filter(|alt| !alt.trim().is_empty())
                .unwrap_or_else(|| name.clone()),
            name,
            price,
            description,
            category,
            image,
            // range checked above
            stock: stock as i32,
        }),
        _ => Err(AppError::ValidationFields(errors)),
    }
}
