//! Typed request bodies and query strings. Bodies derive `Validate`; the
//! failures of one body are folded into a single `Validation` error.

use std::borrow::Cow;
use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use super::pagination::PageQuery;
use super::product::{ProductSort, SortOrder};

pub const PASSWORD_SPECIALS: &str = "@$!%*?&";

fn rule(code: &'static str, message: &'static str) -> ValidationError {
  ValidationError::new(code).with_message(Cow::Borrowed(message))
}

/// 8 to 128 characters with an upper-case letter, a lower-case letter, a digit and one of `@$!%*?&`.
pub fn password_strength(password: &str) -> Result<(), ValidationError> {
  let length = password.chars().count();
  if length < 8 {
    return Err(rule("password_length", "Password must be at least 8 characters"));
  }
  if length > 128 {
    return Err(rule("password_length", "Password must not exceed 128 characters"));
  }
  let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
  let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
  let has_digit = password.chars().any(|c| c.is_ascii_digit());
  let has_special = password.chars().any(|c| PASSWORD_SPECIALS.contains(c));
  if !(has_upper && has_lower && has_digit && has_special) {
    return Err(rule(
      "password_strength",
      "Password must contain uppercase, lowercase, number, and special character (@$!%*?&)",
    ));
  }
  Ok(())
}

fn price_range(price: &Decimal) -> Result<(), ValidationError> {
  if *price < Decimal::new(1, 2) || *price > Decimal::new(99_999_999, 2) {
    return Err(rule("price_range", "Price must be between 0.01 and 999999.99"));
  }
  Ok(())
}

fn image_urls(images: &Vec<String>) -> Result<(), ValidationError> {
  if images
    .iter()
    .all(|url| url.starts_with("https://") || url.starts_with("http://"))
  {
    Ok(())
  } else {
    Err(rule("image_url", "Images must be http(s) URLs"))
  }
}

#[derive(Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
  #[validate(
    email(message = "Invalid email format"),
    length(max = 255, message = "Email must not exceed 255 characters")
  )]
  pub email: String,
  #[validate(custom(function = "password_strength"))]
  pub password: String,
  #[validate(length(min = 1, max = 50, message = "First name must be between 1 and 50 characters"))]
  pub first_name: String,
  #[validate(length(min = 1, max = 50, message = "Last name must be between 1 and 50 characters"))]
  pub last_name: String,
  #[validate(length(max = 20, message = "Phone must not exceed 20 characters"))]
  pub phone: Option<String>,
}

impl RegisterPayload {
  /// Trims names and phone and lower-cases the e-mail, as stored.
  pub fn normalized(self) -> Self {
    Self {
      email: self.email.trim().to_lowercase(),
      password: self.password,
      first_name: self.first_name.trim().to_string(),
      last_name: self.last_name.trim().to_string(),
      phone: self.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
    }
  }
}

#[derive(Clone, Deserialize, Validate)]
pub struct LoginPayload {
  #[validate(email(message = "Invalid email format"))]
  pub email: String,
  #[validate(length(min = 1, message = "Password is required"))]
  pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshPayload {
  pub refresh_token: Option<String>,
}

fn default_quantity() -> i32 {
  1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartPayload {
  pub product_id: Uuid,
  #[serde(default = "default_quantity")]
  pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartItemPayload {
  pub quantity: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderPayload {
  pub address_id: Uuid,
  /// Only `COD` is accepted; absent means `COD`.
  pub payment_method: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusPayload {
  pub status: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
  #[validate(length(min = 1, max = 255, message = "Product name must be between 1 and 255 characters"))]
  pub name: String,
  #[validate(length(min = 10, max = 5000, message = "Description must be between 10 and 5000 characters"))]
  pub description: String,
  #[validate(custom(function = "price_range"))]
  pub price: Decimal,
  #[validate(custom(function = "price_range"))]
  pub discount_price: Option<Decimal>,
  #[validate(range(min = 0, max = 999999, message = "Stock must be between 0 and 999999"))]
  pub stock: i32,
  pub category_id: Uuid,
  pub brand_id: Uuid,
  #[serde(default)]
  #[validate(custom(function = "image_urls"))]
  pub images: Vec<String>,
  #[serde(default)]
  pub specifications: BTreeMap<String, String>,
}

/// Partial product update; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdatePayload {
  #[validate(length(min = 1, max = 255, message = "Product name must be between 1 and 255 characters"))]
  pub name: Option<String>,
  #[validate(length(min = 10, max = 5000, message = "Description must be between 10 and 5000 characters"))]
  pub description: Option<String>,
  #[validate(custom(function = "price_range"))]
  pub price: Option<Decimal>,
  /// `None` leaves the discount alone, `Some(None)` (an explicit `null`) clears it.
  #[serde(default, deserialize_with = "nullable")]
  pub discount_price: Option<Option<Decimal>>,
  #[validate(range(min = 0, max = 999999, message = "Stock must be between 0 and 999999"))]
  pub stock: Option<i32>,
  pub category_id: Option<Uuid>,
  pub brand_id: Option<Uuid>,
  #[validate(custom(function = "image_urls"))]
  pub images: Option<Vec<String>>,
  pub specifications: Option<BTreeMap<String, String>>,
  pub is_active: Option<bool>,
}

impl ProductUpdatePayload {
  /// Range check for a discount that is being set.
  pub fn validate_discount(&self) -> Result<(), ValidationErrors> {
    if let Some(Some(discount)) = &self.discount_price {
      if let Err(error) = price_range(discount) {
        let mut errors = ValidationErrors::new();
        errors.add("discountPrice", error);
        return Err(errors);
      }
    }
    Ok(())
  }
}

fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Option::<T>::deserialize(deserializer).map(Some)
}

/// Category or brand body. `image` also accepts the brand spelling `logo`.
#[derive(Debug, Deserialize, Validate)]
pub struct TaxonomyPayload {
  #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
  pub name: Option<String>,
  #[validate(length(max = 500, message = "Description must not exceed 500 characters"))]
  pub description: Option<String>,
  #[serde(alias = "logo")]
  pub image: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddressPayload {
  #[validate(length(min = 1, max = 100, message = "Full name must be between 1 and 100 characters"))]
  pub full_name: String,
  #[validate(length(min = 1, max = 20, message = "Phone must be between 1 and 20 characters"))]
  pub phone: String,
  #[validate(length(min = 1, max = 255, message = "Address line 1 must be between 1 and 255 characters"))]
  pub address_line1: String,
  #[validate(length(max = 255, message = "Address line 2 must not exceed 255 characters"))]
  pub address_line2: Option<String>,
  #[validate(length(min = 1, max = 100, message = "City must be between 1 and 100 characters"))]
  pub city: String,
  #[validate(length(min = 1, max = 100, message = "State must be between 1 and 100 characters"))]
  pub state: String,
  #[validate(length(min = 1, max = 20, message = "Postal code must be between 1 and 20 characters"))]
  pub postal_code: String,
  #[validate(length(min = 1, max = 100, message = "Country must be between 1 and 100 characters"))]
  pub country: Option<String>,
  #[serde(default)]
  pub is_default: bool,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddressUpdatePayload {
  #[validate(length(min = 1, max = 100, message = "Full name must be between 1 and 100 characters"))]
  pub full_name: Option<String>,
  #[validate(length(min = 1, max = 20, message = "Phone must be between 1 and 20 characters"))]
  pub phone: Option<String>,
  #[validate(length(min = 1, max = 255, message = "Address line 1 must be between 1 and 255 characters"))]
  pub address_line1: Option<String>,
  #[validate(length(max = 255, message = "Address line 2 must not exceed 255 characters"))]
  pub address_line2: Option<String>,
  #[validate(length(min = 1, max = 100, message = "City must be between 1 and 100 characters"))]
  pub city: Option<String>,
  #[validate(length(min = 1, max = 100, message = "State must be between 1 and 100 characters"))]
  pub state: Option<String>,
  #[validate(length(min = 1, max = 20, message = "Postal code must be between 1 and 20 characters"))]
  pub postal_code: Option<String>,
  #[validate(length(min = 1, max = 100, message = "Country must be between 1 and 100 characters"))]
  pub country: Option<String>,
  pub is_default: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfilePayload {
  #[validate(length(min = 1, max = 50, message = "First name must be between 1 and 50 characters"))]
  pub first_name: Option<String>,
  #[validate(length(min = 1, max = 50, message = "Last name must be between 1 and 50 characters"))]
  pub last_name: Option<String>,
  #[validate(length(max = 20, message = "Phone must not exceed 20 characters"))]
  pub phone: Option<String>,
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordPayload {
  #[validate(length(min = 1, message = "Current password is required"))]
  pub current_password: String,
  #[validate(custom(function = "password_strength"))]
  pub new_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistPayload {
  pub product_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListQuery {
  pub page: Option<u32>,
  pub limit: Option<u32>,
  pub category_id: Option<Uuid>,
  pub brand_id: Option<Uuid>,
  pub min_price: Option<Decimal>,
  pub max_price: Option<Decimal>,
  pub in_stock: Option<bool>,
  pub search: Option<String>,
  pub sort_by: Option<ProductSort>,
  pub sort_order: Option<SortOrder>,
}

impl ProductListQuery {
  pub fn page_query(&self) -> PageQuery {
    PageQuery {
      page: self.page,
      limit: self.limit,
    }
  }
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminOrdersQuery {
  pub page: Option<u32>,
  pub limit: Option<u32>,
  pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminUsersQuery {
  pub page: Option<u32>,
  pub limit: Option<u32>,
  pub search: Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn password_policy() {
    assert!(password_strength("Str0ng@pass").is_ok());
    assert!(password_strength("Sh0rt@").is_err());
    assert!(password_strength("nouppercase1@").is_err());
    assert!(password_strength("NoSpecial123").is_err());
    assert!(password_strength(&format!("Aa1@{}", "x".repeat(125))).is_err());
  }

  #[test]
  fn register_payload_collects_every_field_error() {
    let payload = RegisterPayload {
      email: "not-an-email".to_string(),
      password: "weak".to_string(),
      first_name: String::new(),
      last_name: "Rao".to_string(),
      phone: None,
    };
    let errors = payload.validate().unwrap_err();
    let fields = errors.field_errors();
    assert_eq!(fields.len(), 3);
  }

  #[test]
  fn normalization_lowercases_email() {
    let payload = RegisterPayload {
      email: "  Buyer@Example.COM ".to_string(),
      password: "Str0ng@pass".to_string(),
      first_name: " Asha ".to_string(),
      last_name: "Rao".to_string(),
      phone: Some("  ".to_string()),
    }
    .normalized();
    assert_eq!(payload.email, "buyer@example.com");
    assert_eq!(payload.first_name, "Asha");
    assert_eq!(payload.phone, None);
  }

  #[test]
  fn product_payload_rejects_zero_price() {
    let payload: ProductPayload = serde_json::from_value(serde_json::json!({
      "name": "Pixel 9",
      "description": "A capable phone with a great camera",
      "price": "0.00",
      "stock": 4,
      "categoryId": Uuid::new_v4(),
      "brandId": Uuid::new_v4(),
    }))
    .unwrap();
    assert!(payload.validate().is_err());
  }

  #[test]
  fn product_update_tells_missing_discount_from_null() {
    let untouched: ProductUpdatePayload = serde_json::from_value(serde_json::json!({ "stock": 3 })).unwrap();
    assert_eq!(untouched.discount_price, None);

    let cleared: ProductUpdatePayload = serde_json::from_value(serde_json::json!({ "discountPrice": null })).unwrap();
    assert_eq!(cleared.discount_price, Some(None));

    let set: ProductUpdatePayload = serde_json::from_value(serde_json::json!({ "discountPrice": "49.99" })).unwrap();
    assert_eq!(set.discount_price, Some(Some(Decimal::new(4999, 2))));
    assert!(set.validate_discount().is_ok());

    let zero: ProductUpdatePayload = serde_json::from_value(serde_json::json!({ "discountPrice": "0.00" })).unwrap();
    assert!(zero.validate_discount().is_err());
  }
}
