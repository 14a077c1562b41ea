//! Input validation for registration, password change, recipes and
//! subscriptions
//!
//! Validators are pure: they look only at the payload. Checks that need the
//! database (unknown ids, taken usernames) are run by the handlers, which add
//! their findings to the same [`ValidationErrors`] map so the client gets one
//! combined answer.

use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

use crate::error::ApiError;
use crate::images::{self, DecodedImage};
use crate::models::{
    recipe::{IngredientAmount, RecipeWriteRequest},
    user::{CreateUserRequest, NewUser, SetPasswordRequest},
};

pub const MIN_COOKING_TIME: i64 = 1;
pub const MAX_COOKING_TIME: i64 = 5000;
pub const MIN_AMOUNT: i64 = 1;
pub const MAX_AMOUNT: i64 = 5000;
pub const RECIPE_NAME_MAX_LEN: usize = 200;
pub const USERNAME_MAX_LEN: usize = 150;
pub const EMAIL_MAX_LEN: usize = 254;
pub const PERSON_NAME_MAX_LEN: usize = 150;
pub const PASSWORD_MAX_LEN: usize = 150;

const REQUIRED: &str = "This field is required.";

/// Field name to messages, serialized as a flat JSON object
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `Ok(value)` when nothing was recorded
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

fn too_long(max: usize) -> String {
    format!("Ensure this field has no more than {} characters.", max)
}

/// Required, non-blank, length-bounded string field; returns the trimmed value
fn required_str(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&str>,
    max_len: usize,
) -> Option<String> {
    let value = match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => {
            errors.add(field, REQUIRED);
            return None;
        }
    };

    if value.chars().count() > max_len {
        errors.add(field, too_long(max_len));
        return None;
    }

    Some(value.to_string())
}

/// Required, length-bounded secret kept exactly as typed
fn required_secret(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&str>,
    max_len: usize,
) -> Option<String> {
    let value = match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => {
            errors.add(field, REQUIRED);
            return None;
        }
    };

    if value.chars().count() > max_len {
        errors.add(field, too_long(max_len));
        return None;
    }

    Some(value.to_string())
}

fn username_regex() -> &'static Regex {
    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[\w.@+-]+$").expect("Failed to compile username regex"))
}

fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    })
}

/// Validate a registration payload
///
/// Uniqueness of username and email is checked by the caller.
pub fn validate_new_user(req: &CreateUserRequest) -> Result<NewUser, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let email = required_str(&mut errors, "email", req.email.as_deref(), EMAIL_MAX_LEN);
    if let Some(email) = &email {
        if !email_regex().is_match(email) {
            errors.add("email", "Enter a valid email address.");
        }
    }

    let username = required_str(
        &mut errors,
        "username",
        req.username.as_deref(),
        USERNAME_MAX_LEN,
    );
    if let Some(username) = &username {
        if !username_regex().is_match(username) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }
    }

    let first_name = required_str(
        &mut errors,
        "first_name",
        req.first_name.as_deref(),
        PERSON_NAME_MAX_LEN,
    );
    let last_name = required_str(
        &mut errors,
        "last_name",
        req.last_name.as_deref(),
        PERSON_NAME_MAX_LEN,
    );
    let password = required_secret(
        &mut errors,
        "password",
        req.password.as_deref(),
        PASSWORD_MAX_LEN,
    );

    match (email, username, first_name, last_name, password) {
        (Some(email), Some(username), Some(first_name), Some(last_name), Some(password))
            if errors.is_empty() =>
        {
            Ok(NewUser {
                email: email.to_lowercase(),
                username,
                first_name,
                last_name,
                password,
            })
        }
        _ => Err(errors),
    }
}

/// Validate a password change payload, returning `(current, new)`
pub fn validate_set_password(
    req: &SetPasswordRequest,
) -> Result<(String, String), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let current = match req.current_password.as_deref() {
        Some(p) if !p.is_empty() => Some(p.to_string()),
        _ => {
            errors.add("current_password", REQUIRED);
            None
        }
    };
    let new = required_secret(
        &mut errors,
        "new_password",
        req.new_password.as_deref(),
        PASSWORD_MAX_LEN,
    );

    match (current, new) {
        (Some(current), Some(new)) => Ok((current, new)),
        _ => Err(errors),
    }
}

/// Whether the image is mandatory for this write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeWrite {
    Create,
    Update,
}

/// A recipe payload that passed every check not needing the database
#[derive(Debug, Clone)]
pub struct ValidRecipe {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: Option<DecodedImage>,
    pub tag_ids: Vec<i64>,
    pub ingredients: Vec<IngredientAmount>,
}

/// Validate a recipe create or update payload
pub fn validate_recipe(
    req: &RecipeWriteRequest,
    mode: RecipeWrite,
) -> Result<ValidRecipe, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let name = required_str(&mut errors, "name", req.name.as_deref(), RECIPE_NAME_MAX_LEN);
    let text = required_str(&mut errors, "text", req.text.as_deref(), usize::MAX);

    let cooking_time = match req.cooking_time {
        None => {
            errors.add("cooking_time", REQUIRED);
            None
        }
        Some(t) if t < MIN_COOKING_TIME => {
            errors.add(
                "cooking_time",
                format!(
                    "Ensure this value is greater than or equal to {}.",
                    MIN_COOKING_TIME
                ),
            );
            None
        }
        Some(t) if t > MAX_COOKING_TIME => {
            errors.add(
                "cooking_time",
                format!(
                    "Ensure this value is less than or equal to {}.",
                    MAX_COOKING_TIME
                ),
            );
            None
        }
        Some(t) => Some(t as i32),
    };

    let image = match req.image.as_deref().map(str::trim) {
        Some(data) if !data.is_empty() => match images::decode_data_url(data) {
            Ok(image) => Some(image),
            Err(e) => {
                errors.add("image", e.to_string());
                None
            }
        },
        _ => {
            if mode == RecipeWrite::Create {
                errors.add("image", "Add an image.");
            }
            None
        }
    };

    let mut ingredients = Vec::new();
    match req.ingredients.as_deref() {
        None | Some([]) => errors.add("ingredients", "Add at least one ingredient."),
        Some(items) => {
            let mut seen = HashSet::new();
            let mut duplicate = false;
            for item in items {
                if !(MIN_AMOUNT..=MAX_AMOUNT).contains(&item.amount) {
                    errors.add(
                        "ingredients",
                        format!(
                            "Ingredient amount must be between {} and {}.",
                            MIN_AMOUNT, MAX_AMOUNT
                        ),
                    );
                    continue;
                }
                if !seen.insert(item.id) {
                    duplicate = true;
                    continue;
                }
                ingredients.push(IngredientAmount {
                    ingredient_id: item.id,
                    amount: item.amount as i32,
                });
            }
            if duplicate {
                errors.add("ingredients", "Ingredients must not repeat.");
            }
        }
    }

    let mut tag_ids = Vec::new();
    match req.tags.as_deref() {
        None | Some([]) => errors.add("tags", "Add at least one tag."),
        Some(items) => {
            let mut seen = HashSet::new();
            for id in items {
                if seen.insert(*id) {
                    tag_ids.push(*id);
                }
            }
            if tag_ids.len() != items.len() {
                errors.add("tags", "Tags must not repeat.");
            }
        }
    }

    match (name, text, cooking_time) {
        (Some(name), Some(text), Some(cooking_time)) if errors.is_empty() => Ok(ValidRecipe {
            name,
            text,
            cooking_time,
            image,
            tag_ids,
            ingredients,
        }),
        _ => Err(errors),
    }
}

/// Subscription rules: no following yourself, no following twice
pub fn validate_subscription(
    user_id: i64,
    author_id: i64,
    already_subscribed: bool,
) -> Result<(), ApiError> {
    if user_id == author_id {
        return Err(ApiError::BadRequest(
            "You cannot subscribe to yourself.".to_string(),
        ));
    }
    if already_subscribed {
        return Err(ApiError::BadRequest(
            "You are already subscribed to this author.".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::recipe::IngredientAmountInput;

    const PIXEL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";

    fn user_request() -> CreateUserRequest {
        CreateUserRequest {
            email: Some("Vasya@Example.com".to_string()),
            username: Some("vasya.pupkin".to_string()),
            first_name: Some("Vasya".to_string()),
            last_name: Some("Pupkin".to_string()),
            password: Some("Qwerty123".to_string()),
        }
    }

    fn recipe_request() -> RecipeWriteRequest {
        RecipeWriteRequest {
            name: Some("Pancakes".to_string()),
            text: Some("Mix and fry.".to_string()),
            cooking_time: Some(20),
            image: Some(PIXEL.to_string()),
            tags: Some(vec![1, 2]),
            ingredients: Some(vec![
                IngredientAmountInput { id: 10, amount: 200 },
                IngredientAmountInput { id: 11, amount: 2 },
            ]),
        }
    }

    #[test]
    fn test_valid_user() {
        let user = validate_new_user(&user_request()).unwrap();
        assert_eq!(user.email, "vasya@example.com");
        assert_eq!(user.username, "vasya.pupkin");
    }

    #[test]
    fn test_user_missing_fields_are_each_reported() {
        let errors = validate_new_user(&CreateUserRequest {
            email: None,
            username: None,
            first_name: Some("  ".to_string()),
            last_name: None,
            password: None,
        })
        .unwrap_err();

        for field in ["email", "username", "first_name", "last_name", "password"] {
            assert_eq!(errors.messages(field), [REQUIRED], "{}", field);
        }
    }

    #[test]
    fn test_username_character_class() {
        let mut req = user_request();
        req.username = Some("bad name!".to_string());
        assert!(validate_new_user(&req).unwrap_err().contains("username"));

        req.username = Some("ok_name-1+@.".to_string());
        assert!(validate_new_user(&req).is_ok());
    }

    #[test]
    fn test_user_field_lengths() {
        let mut req = user_request();
        req.first_name = Some("a".repeat(PERSON_NAME_MAX_LEN + 1));
        req.password = Some("p".repeat(PASSWORD_MAX_LEN + 1));
        let errors = validate_new_user(&req).unwrap_err();
        assert_eq!(errors.messages("first_name"), [too_long(PERSON_NAME_MAX_LEN)]);
        assert!(errors.contains("password"));
    }

    #[test]
    fn test_invalid_email() {
        let mut req = user_request();
        req.email = Some("not-an-email".to_string());
        assert!(validate_new_user(&req).unwrap_err().contains("email"));
    }

    #[test]
    fn test_password_kept_as_typed() {
        let mut req = user_request();
        req.password = Some("  secret  ".to_string());
        let user = validate_new_user(&req).unwrap();
        assert_eq!(user.password, "  secret  ");

        let hash = common::password::hash_password(&user.password).unwrap();
        assert!(common::password::verify_password("  secret  ", &hash).unwrap());
        assert!(!common::password::verify_password("secret", &hash).unwrap());
    }

    #[test]
    fn test_blank_password_rejected() {
        let mut req = user_request();
        req.password = Some("   ".to_string());
        assert_eq!(validate_new_user(&req).unwrap_err().messages("password"), [REQUIRED]);
    }

    #[test]
    fn test_new_password_kept_as_typed() {
        let (current, new) = validate_set_password(&SetPasswordRequest {
            current_password: Some(" old ".to_string()),
            new_password: Some(" new pass ".to_string()),
        })
        .unwrap();
        assert_eq!(current, " old ");
        assert_eq!(new, " new pass ");
    }

    #[test]
    fn test_set_password_requires_both() {
        let errors = validate_set_password(&SetPasswordRequest {
            current_password: None,
            new_password: Some("new".to_string()),
        })
        .unwrap_err();
        assert!(errors.contains("current_password"));
        assert!(!errors.contains("new_password"));
    }

    #[test]
    fn test_valid_recipe() {
        let recipe = validate_recipe(&recipe_request(), RecipeWrite::Create).unwrap();
        assert_eq!(recipe.cooking_time, 20);
        assert_eq!(recipe.tag_ids, vec![1, 2]);
        assert_eq!(recipe.ingredients.len(), 2);
        assert_eq!(recipe.image.unwrap().extension, "png");
    }

    #[test]
    fn test_cooking_time_bounds() {
        for (time, ok) in [(0, false), (1, true), (5000, true), (5001, false), (-3, false)] {
            let mut req = recipe_request();
            req.cooking_time = Some(time);
            let result = validate_recipe(&req, RecipeWrite::Create);
            assert_eq!(result.is_ok(), ok, "cooking_time = {}", time);
            if !ok {
                assert!(result.unwrap_err().contains("cooking_time"));
            }
        }
    }

    #[test]
    fn test_ingredient_amount_bounds() {
        for amount in [0, 5001] {
            let mut req = recipe_request();
            req.ingredients = Some(vec![IngredientAmountInput { id: 10, amount }]);
            assert!(
                validate_recipe(&req, RecipeWrite::Create)
                    .unwrap_err()
                    .contains("ingredients")
            );
        }
    }

    #[test]
    fn test_duplicate_ingredients_rejected() {
        let mut req = recipe_request();
        req.ingredients = Some(vec![
            IngredientAmountInput { id: 10, amount: 1 },
            IngredientAmountInput { id: 10, amount: 2 },
        ]);
        let errors = validate_recipe(&req, RecipeWrite::Create).unwrap_err();
        assert_eq!(errors.messages("ingredients"), ["Ingredients must not repeat."]);
    }

    #[test]
    fn test_duplicate_tags_rejected() {
        let mut req = recipe_request();
        req.tags = Some(vec![1, 1]);
        let errors = validate_recipe(&req, RecipeWrite::Create).unwrap_err();
        assert_eq!(errors.messages("tags"), ["Tags must not repeat."]);
    }

    #[test]
    fn test_empty_tags_ingredients_and_missing_image() {
        let mut req = recipe_request();
        req.tags = Some(vec![]);
        assert!(validate_recipe(&req, RecipeWrite::Create).unwrap_err().contains("tags"));

        let mut req = recipe_request();
        req.ingredients = None;
        assert!(
            validate_recipe(&req, RecipeWrite::Create)
                .unwrap_err()
                .contains("ingredients")
        );

        let mut req = recipe_request();
        req.image = None;
        assert!(validate_recipe(&req, RecipeWrite::Create).unwrap_err().contains("image"));
    }

    #[test]
    fn test_image_optional_on_update() {
        let mut req = recipe_request();
        req.image = None;
        let recipe = validate_recipe(&req, RecipeWrite::Update).unwrap();
        assert!(recipe.image.is_none());
    }

    #[test]
    fn test_garbage_image_rejected() {
        let mut req = recipe_request();
        req.image = Some("data:image/png;base64,@@@".to_string());
        assert!(validate_recipe(&req, RecipeWrite::Update).unwrap_err().contains("image"));
    }

    #[test]
    fn test_subscription_rules() {
        assert!(validate_subscription(1, 2, false).is_ok());
        assert!(matches!(
            validate_subscription(1, 1, false),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            validate_subscription(1, 2, true),
            Err(ApiError::BadRequest(_))
        ));
    }
}
