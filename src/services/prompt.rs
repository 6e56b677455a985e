/// Instruction sent with every image. The validator relies on this schema.
pub const ANALYSIS_PROMPT: &str = "You are a nutrition analysis expert. Look carefully at the food in this photo.\n\
\n\
1. Identify the main dish and any sides or drinks.\n\
2. Estimate the portion size visually.\n\
3. Estimate the nutrition values for the whole portion shown.\n\
\n\
Respond with ONLY a JSON object, no markdown, no explanation, in exactly this format:\n\
{\n\
\"food\": \"name of the food\",\n\
\"nutritionInfo\": {\n\
\"calories\": \"value with unit, e.g. 250 kcal\",\n\
\"protein\": \"value with unit, e.g. 12 g\",\n\
\"fat\": \"value with unit, e.g. 8 g\",\n\
\"carbs\": \"value with unit, e.g. 30 g\",\n\
\"fiber\": \"value with unit, e.g. 4 g\",\n\
\"sugar\": \"value with unit, e.g. 6 g\",\n\
\"sodium\": \"value with unit, e.g. 400 mg\"\n\
},\n\
\"healthierAlternative\": \"a short suggestion for a healthier option\",\n\
\"mealType\": \"one of: Breakfast, Lunch, Dinner, Snack\",\n\
\"isDietFriendly\": {\n\
\"keto\": true or false,\n\
\"vegan\": true or false,\n\
\"vegetarian\": true or false,\n\
\"glutenFree\": true or false\n\
},\n\
\"confidence\": \"one of: high, medium, low\"\n\
}";

pub fn analysis_prompt() -> &'static str {
    ANALYSIS_PROMPT
}
