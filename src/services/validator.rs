//! Turns free-form model text into a validated [`AnalysisResult`].
//!
//! The model is asked for bare JSON but routinely wraps it in prose or a
//! markdown fence, so parsing falls back to the outermost `{ ... }` span.
//! Required fields are checked before any defaults are filled in; a payload
//! without them is rejected rather than padded.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{AnalysisError, MalformedReason};
use crate::models::{
    AnalysisResult, Confidence, DietFriendly, NutritionInfo, DEFAULT_HEALTHIER_ALTERNATIVE,
    DEFAULT_MEAL_TYPE,
};

/// Payload as the model sent it. Every member is optional so that a
/// mistyped or missing field never aborts deserialization.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnalysis {
    #[serde(default, deserialize_with = "loose_string")]
    food: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    nutrition_info: Option<RawNutrition>,
    #[serde(default, deserialize_with = "loose_string")]
    healthier_alternative: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    meal_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    is_diet_friendly: Option<RawDietFlags>,
    #[serde(default, deserialize_with = "loose_string")]
    confidence: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawNutrition {
    #[serde(default, deserialize_with = "loose_string")]
    calories: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    protein: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    carbs: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    fat: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    fiber: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    sugar: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    sodium: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDietFlags {
    #[serde(default, deserialize_with = "loose_bool")]
    keto: bool,
    #[serde(default, deserialize_with = "loose_bool")]
    vegan: bool,
    #[serde(default, deserialize_with = "loose_bool")]
    vegetarian: bool,
    #[serde(default, deserialize_with = "loose_bool")]
    gluten_free: bool,
}

/// Deserialize `T` if the value has the right shape, otherwise treat it as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

/// Strings are kept as-is, numbers are rendered, empty strings count as absent.
fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn loose_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => b,
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes"),
        _ => false,
    })
}

/// Locate and parse the JSON object in a model response.
pub fn extract_json(text: &str) -> Result<Value, AnalysisError> {
    let trimmed = text.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    let start = trimmed.find('{');
    let end = trimmed.rfind('}');
    let candidate = match (start, end) {
        (Some(start), Some(end)) if end > start => &trimmed[start..=end],
        _ => {
            return Err(AnalysisError::MalformedResponse(
                MalformedReason::NoJsonPattern,
            ))
        }
    };

    serde_json::from_str::<Value>(candidate).map_err(|e| {
        log::debug!("Embedded JSON did not parse: {}", e);
        AnalysisError::MalformedResponse(MalformedReason::InvalidJson)
    })
}

/// Parse, check and normalize a raw model response.
pub fn validate_response(text: &str) -> Result<AnalysisResult, AnalysisError> {
    let value = extract_json(text)?;

    // A bare array or scalar has no food field at all.
    let raw: RawAnalysis = if value.is_object() {
        serde_json::from_value(value)
            .map_err(|_| AnalysisError::MalformedResponse(MalformedReason::InvalidJson))?
    } else {
        RawAnalysis::default()
    };

    normalize(raw)
}

fn normalize(raw: RawAnalysis) -> Result<AnalysisResult, AnalysisError> {
    let food = raw.food.ok_or_else(|| AnalysisError::missing("food"))?;
    let nutrition = raw
        .nutrition_info
        .ok_or_else(|| AnalysisError::missing("nutritionInfo"))?;

    let mut missing = Vec::new();
    if nutrition.calories.is_none() {
        missing.push("calories".to_string());
    }
    if nutrition.protein.is_none() {
        missing.push("protein".to_string());
    }
    if nutrition.carbs.is_none() {
        missing.push("carbs".to_string());
    }

    let (calories, protein, carbs) = match (nutrition.calories, nutrition.protein, nutrition.carbs)
    {
        (Some(calories), Some(protein), Some(carbs)) => (calories, protein, carbs),
        _ => return Err(AnalysisError::MissingField(missing)),
    };

    let diet = raw.is_diet_friendly.unwrap_or_default();

    Ok(AnalysisResult {
        food,
        nutrition_info: NutritionInfo {
            calories,
            protein,
            carbs,
            fat: nutrition.fat,
            fiber: nutrition.fiber,
            sugar: nutrition.sugar,
            sodium: nutrition.sodium,
        },
        healthier_alternative: raw
            .healthier_alternative
            .unwrap_or_else(|| DEFAULT_HEALTHIER_ALTERNATIVE.to_string()),
        meal_type: raw
            .meal_type
            .unwrap_or_else(|| DEFAULT_MEAL_TYPE.to_string()),
        is_diet_friendly: DietFriendly {
            keto: diet.keto,
            vegan: diet.vegan,
            vegetarian: diet.vegetarian,
            gluten_free: diet.gluten_free,
        },
        confidence: raw
            .confidence
            .as_deref()
            .and_then(Confidence::from_string)
            .unwrap_or_default(),
        raw_response: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_payload() -> Value {
        json!({
            "food": "Grilled chicken salad",
            "nutritionInfo": {
                "calories": "350 kcal",
                "protein": "32 g",
                "fat": "15 g",
                "carbs": "12 g",
                "fiber": "5 g",
                "sugar": "4 g",
                "sodium": "480 mg"
            },
            "healthierAlternative": "Use a lemon dressing instead of ranch",
            "mealType": "Lunch",
            "isDietFriendly": {
                "keto": true,
                "vegan": false,
                "vegetarian": false,
                "glutenFree": true
            },
            "confidence": "high"
        })
    }

    #[test]
    fn test_apple_slices_get_defaults() {
        let text = r#"{"food":"Apple slices","nutritionInfo":{"calories":"95 kcal","protein":"0.5 g","carbs":"25 g"}}"#;
        let result = validate_response(text).unwrap();

        assert_eq!(result.food, "Apple slices");
        assert_eq!(result.nutrition_info.calories, "95 kcal");
        assert_eq!(result.nutrition_info.protein, "0.5 g");
        assert_eq!(result.nutrition_info.carbs, "25 g");
        assert_eq!(result.nutrition_info.fat, None);
        assert_eq!(result.meal_type, "Unknown");
        assert_eq!(result.confidence, Confidence::Medium);
        assert_eq!(result.is_diet_friendly, DietFriendly::default());
        assert_eq!(result.healthier_alternative, DEFAULT_HEALTHIER_ALTERNATIVE);
        assert_eq!(result.raw_response, None);
    }

    #[test]
    fn test_full_payload_preserved() {
        let result = validate_response(&full_payload().to_string()).unwrap();

        assert_eq!(result.food, "Grilled chicken salad");
        assert_eq!(result.nutrition_info.sodium.as_deref(), Some("480 mg"));
        assert_eq!(result.meal_type, "Lunch");
        assert_eq!(result.confidence, Confidence::High);
        assert!(result.is_diet_friendly.keto);
        assert!(result.is_diet_friendly.gluten_free);
        assert!(!result.is_diet_friendly.vegan);
    }

    #[test]
    fn test_serialized_result_revalidates() {
        let first = validate_response(&full_payload().to_string()).unwrap();
        let text = serde_json::to_string(&first).unwrap();
        let second = validate_response(&text).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_markdown_wrapped_json() {
        let text = format!(
            "Here is the result:\n```json\n{}\n```",
            serde_json::to_string_pretty(&full_payload()).unwrap()
        );
        let result = validate_response(&text).unwrap();
        assert_eq!(result.food, "Grilled chicken salad");
    }

    #[test]
    fn test_prose_around_json() {
        let text = r#"Sure! {"food":"Toast","nutritionInfo":{"calories":"80 kcal","protein":"3 g","carbs":"15 g"}} Enjoy your meal."#;
        assert_eq!(validate_response(text).unwrap().food, "Toast");
    }

    #[test]
    fn test_no_json_pattern() {
        let err = validate_response("I cannot identify any food in this image.").unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::MalformedResponse(MalformedReason::NoJsonPattern)
        ));
    }

    #[test]
    fn test_invalid_embedded_json() {
        let err = validate_response("Result: {food: Apple, calories: 95}").unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::MalformedResponse(MalformedReason::InvalidJson)
        ));
    }

    #[test]
    fn test_reversed_braces_have_no_pattern() {
        let err = validate_response("} nothing here {").unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::MalformedResponse(MalformedReason::NoJsonPattern)
        ));
    }

    #[test]
    fn test_each_required_field_reported() {
        let cases: [(&str, &str); 5] = [
            ("/food", "food"),
            ("/nutritionInfo", "nutritionInfo"),
            ("/nutritionInfo/calories", "calories"),
            ("/nutritionInfo/protein", "protein"),
            ("/nutritionInfo/carbs", "carbs"),
        ];

        for (pointer, field) in cases {
            let mut payload = full_payload();
            let (parent, key) = pointer.rsplit_once('/').unwrap();
            let parent = if parent.is_empty() {
                &mut payload
            } else {
                payload.pointer_mut(parent).unwrap()
            };
            parent.as_object_mut().unwrap().remove(key);

            match validate_response(&payload.to_string()) {
                Err(AnalysisError::MissingField(fields)) => {
                    assert_eq!(fields, vec![field.to_string()], "removing {}", pointer)
                }
                other => panic!("expected missing {}, got {:?}", field, other),
            }
        }
    }

    #[test]
    fn test_all_missing_nutrition_keys_reported() {
        let text = r#"{"food":"Soup","nutritionInfo":{"protein":"4 g"}}"#;
        let err = validate_response(text).unwrap_err();
        match err {
            AnalysisError::MissingField(fields) => assert_eq!(fields, vec!["calories", "carbs"]),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_empty_food_is_missing() {
        let text = r#"{"food":"  ","nutritionInfo":{"calories":"1","protein":"1","carbs":"1"}}"#;
        assert!(matches!(
            validate_response(text),
            Err(AnalysisError::MissingField(f)) if f == vec!["food"]
        ));
    }

    #[test]
    fn test_nutrition_info_not_an_object() {
        let text = r#"{"food":"Rice","nutritionInfo":"about 200 kcal"}"#;
        assert!(matches!(
            validate_response(text),
            Err(AnalysisError::MissingField(f)) if f == vec!["nutritionInfo"]
        ));
    }

    #[test]
    fn test_non_object_json_misses_food() {
        assert!(matches!(
            validate_response(r#"["apple"]"#),
            Err(AnalysisError::MissingField(f)) if f == vec!["food"]
        ));
    }

    #[test]
    fn test_numeric_values_and_falsy_optionals() {
        let text = r#"{
            "food": "Banana",
            "nutritionInfo": {"calories": 105, "protein": 1.3, "carbs": "27 g"},
            "healthierAlternative": "",
            "mealType": null,
            "isDietFriendly": "yes",
            "confidence": "LOW"
        }"#;
        let result = validate_response(text).unwrap();

        assert_eq!(result.nutrition_info.calories, "105");
        assert_eq!(result.nutrition_info.protein, "1.3");
        assert_eq!(result.healthier_alternative, DEFAULT_HEALTHIER_ALTERNATIVE);
        assert_eq!(result.meal_type, "Unknown");
        assert_eq!(result.is_diet_friendly, DietFriendly::default());
        assert_eq!(result.confidence, Confidence::Low);
    }

    #[test]
    fn test_unknown_confidence_defaults_to_medium() {
        let text = r#"{"food":"Pie","nutritionInfo":{"calories":"300 kcal","protein":"4 g","carbs":"40 g"},"confidence":"very sure"}"#;
        assert_eq!(validate_response(text).unwrap().confidence, Confidence::Medium);
    }

    #[test]
    fn test_partial_diet_flags() {
        let text = r#"{"food":"Tofu bowl","nutritionInfo":{"calories":"400 kcal","protein":"20 g","carbs":"45 g"},"isDietFriendly":{"vegan":true,"vegetarian":"true"}}"#;
        let diet = validate_response(text).unwrap().is_diet_friendly;
        assert!(diet.vegan);
        assert!(diet.vegetarian);
        assert!(!diet.keto);
        assert!(!diet.gluten_free);
    }
}
