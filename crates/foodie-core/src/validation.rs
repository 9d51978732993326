//! # Validation Module
//!
//! Input validation for request payloads.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Storefront frontend                                          │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: axum handler (Rust)                                          │
//! │  ├── Type validation (JSON deserialization)                            │
//! │  └── THIS MODULE: field rules                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE constraints (email, username, slug, promo code)            │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use foodie_core::validation::{validate_email, validate_quantity};
//!
//! validate_email("john@example.com").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::types::Pagination;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Largest page size any listing accepts.
pub const MAX_PAGE_LIMIT: i64 = 100;

fn required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn max_len(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

// =============================================================================
// Account Validators
// =============================================================================

/// Validates an email address.
///
/// ## Rules
/// - One `@` with a non-empty local part
/// - Domain contains a dot that is neither first nor last
/// - No whitespace, at most 254 characters
///
/// ## Example
/// ```rust
/// use foodie_core::validation::validate_email;
///
/// assert!(validate_email("admin@foodie.com").is_ok());
/// assert!(validate_email("admin@foodie").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    required("email", email)?;
    max_len("email", email, 254)?;

    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must be a valid email address".to_string(),
    };

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }

    match domain.rfind('.') {
        Some(dot) if dot > 0 && dot < domain.len() - 1 => Ok(()),
        _ => Err(invalid()),
    }
}

/// Validates a username.
///
/// ## Rules
/// - 3 to 30 characters
/// - Letters, numbers and underscores only
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = username.trim();
    required("username", username)?;

    if username.chars().count() < 3 {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: 3,
        });
    }
    max_len("username", username, 30)?;

    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must contain only letters, numbers, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a password. At least 6 characters.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }

    if password.chars().count() < 6 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 6,
        });
    }

    max_len("password", password, 128)
}

/// Validates a display name (restaurant, dish, person).
///
/// ## Example
/// ```rust
/// use foodie_core::validation::validate_name;
///
/// assert!(validate_name("name", "Bella Italia").is_ok());
/// assert!(validate_name("name", "  ").is_err());
/// ```
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();
    required(field, name)?;
    max_len(field, name, 200)
}

// =============================================================================
// Catalog Validators
// =============================================================================

/// Validates a restaurant slug: lowercase letters, digits and single hyphens.
///
/// ## Example
/// ```rust
/// use foodie_core::validation::validate_slug;
///
/// assert!(validate_slug("bella-italia").is_ok());
/// assert!(validate_slug("Bella Italia").is_err());
/// ```
pub fn validate_slug(slug: &str) -> ValidationResult<()> {
    required("slug", slug)?;
    max_len("slug", slug, 100)?;

    let valid_chars = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');

    if !valid_chars || slug.starts_with('-') || slug.ends_with('-') || slug.contains("--") {
        return Err(ValidationError::InvalidFormat {
            field: "slug".to_string(),
            reason: "must contain only lowercase letters, numbers, and single hyphens".to_string(),
        });
    }

    Ok(())
}

/// Builds a slug from a display name: `"Thai Orchid!"` → `"thai-orchid"`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Validates a review rating (1 to 5 stars).
pub fn validate_rating(rating: i64) -> ValidationResult<()> {
    if !(1..=5).contains(&rating) {
        return Err(ValidationError::OutOfRange {
            field: "rating".to_string(),
            min: 1,
            max: 5,
        });
    }
    Ok(())
}

/// Validates review text: non-blank, at most 2000 characters.
pub fn validate_comment(comment: &str) -> ValidationResult<()> {
    let comment = comment.trim();
    required("comment", comment)?;
    max_len("comment", comment, 2000)
}

/// Validates a promo code: 3 to 32 letters, digits, `-` or `_`.
///
/// ## Returns
/// The code upper-cased, which is how codes are stored and matched.
pub fn validate_promo_code(code: &str) -> ValidationResult<String> {
    let code = code.trim();
    required("code", code)?;

    if code.chars().count() < 3 {
        return Err(ValidationError::TooShort {
            field: "code".to_string(),
            min: 3,
        });
    }
    max_len("code", code, 32)?;

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(code.to_ascii_uppercase())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (returns all/default results)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();
    max_len("search", query, 100)?;
    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (99)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Checkout: item line                                                    │
/// │                                                                         │
/// │  Client sends quantity: 5                                               │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                   │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"                │
/// │       │                                                                 │
/// │       ├── qty > 99? → Error: "quantity must be between 1 and 99"        │
/// │       │                                                                 │
/// │       └── OK → Re-price line from the database                          │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// ## Example
/// ```rust
/// use foodie_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());  // $10.99
/// assert!(validate_price_cents(0).is_ok());     // Free side
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a percentage in basis points (0 to 10000).
pub fn validate_bps(field: &str, bps: i64) -> ValidationResult<()> {
    if !(0..=10_000).contains(&bps) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

/// Validates the number of lines in a checkout request.
pub fn validate_line_count(lines: usize) -> ValidationResult<()> {
    if lines == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if lines > MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

/// Validates optional `page` / `limit` query values and fills defaults.
///
/// ## Example
/// ```rust
/// use foodie_core::validation::validate_pagination;
///
/// let p = validate_pagination(None, None, 10).unwrap();
/// assert_eq!((p.page, p.limit), (1, 10));
/// assert!(validate_pagination(Some(0), None, 10).is_err());
/// assert!(validate_pagination(None, Some(101), 10).is_err());
/// ```
pub fn validate_pagination(
    page: Option<i64>,
    limit: Option<i64>,
    default_limit: i64,
) -> ValidationResult<Pagination> {
    let page = page.unwrap_or(1);
    let limit = limit.unwrap_or(default_limit);

    if page < 1 {
        return Err(ValidationError::OutOfRange {
            field: "page".to_string(),
            min: 1,
            max: i64::MAX,
        });
    }

    if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
        return Err(ValidationError::OutOfRange {
            field: "limit".to_string(),
            min: 1,
            max: MAX_PAGE_LIMIT,
        });
    }

    Ok(Pagination::new(page, limit))
}

// =============================================================================
// Unit Tests
// =============================================================================
