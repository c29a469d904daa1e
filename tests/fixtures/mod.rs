//! Recipe and provider payload fixtures.

#![allow(dead_code)]

use serde_json::{json, Value};

use recipe_cascade::models::recipe::{Recipe, RecipeIngredient};

fn ingredient(slug: &str, name: &str, amount: &str) -> RecipeIngredient {
    RecipeIngredient {
        slug: slug.to_string(),
        name: name.to_string(),
        amount: amount.to_string(),
    }
}

fn recipe(
    id: &str,
    title: &str,
    cuisine: &str,
    dish_type: &str,
    ingredients: Vec<RecipeIngredient>,
    quality_score: u8,
) -> Recipe {
    Recipe {
        id: id.to_string(),
        title: title.to_string(),
        cuisine: cuisine.to_string(),
        dish_type: dish_type.to_string(),
        ingredients,
        instructions: vec![
            "Prepare the ingredients.".to_string(),
            "Cook everything together until done.".to_string(),
        ],
        prep_time: 15,
        cook_time: 20,
        servings: 4,
        source: id.split('_').next().unwrap_or("test").to_string(),
        quality_score,
        times_served: 0,
    }
}

/// Mexican chicken-thigh tacos; a generic "chicken" request reaches it
/// through family expansion.
pub fn chicken_tacos() -> Recipe {
    recipe(
        "themealdb_90001",
        "Chicken Tinga Tacos",
        "mexican",
        "main-course",
        vec![
            ingredient("chicken_thigh", "Chicken Thighs", "500 g"),
            ingredient("corn_tortilla", "Corn Tortillas", "8"),
            ingredient("onion", "Onion", "1"),
        ],
        80,
    )
}

/// Meat-bearing Mexican salsa, higher quality than the vegetarian one.
pub fn chorizo_salsa() -> Recipe {
    recipe(
        "spoonacular_90002",
        "Chorizo Salsa",
        "mexican",
        "main-course",
        vec![
            ingredient("chorizo", "Chorizo", "200 g"),
            ingredient("onion", "Onion", "1"),
            ingredient("tomato", "Tomatoes", "3"),
        ],
        95,
    )
}

pub fn pico_de_gallo() -> Recipe {
    recipe(
        "themealdb_90003",
        "Pico de Gallo",
        "mexican",
        "main-course",
        vec![
            ingredient("onion", "Onion", "1"),
            ingredient("tomato", "Tomatoes", "4"),
            ingredient("cilantro", "Cilantro", "1 bunch"),
        ],
        50,
    )
}

/// Thai chicken dish sharing two ingredients with the surf-and-turf request
/// but only one of its proteins.
pub fn thai_chicken_lemongrass() -> Recipe {
    recipe(
        "themealdb_90004",
        "Lemongrass Chicken",
        "thai",
        "stir-fry",
        vec![
            ingredient("chicken", "Chicken", "400 g"),
            ingredient("lemongrass", "Lemongrass", "2 stalks"),
        ],
        95,
    )
}

pub fn thai_chicken_shrimp() -> Recipe {
    recipe(
        "themealdb_90005",
        "Chicken and Prawn Stir Fry",
        "thai",
        "stir-fry",
        vec![
            ingredient("chicken_breast", "Chicken Breast", "300 g"),
            ingredient("shrimp", "Prawns", "200 g"),
        ],
        60,
    )
}

/// Egg and chorizo: acceptable for an egg request unless meat is ruled out.
pub fn huevos_con_chorizo() -> Recipe {
    recipe(
        "themealdb_90006",
        "Huevos con Chorizo",
        "mexican",
        "breakfast",
        vec![
            ingredient("egg", "Eggs", "4"),
            ingredient("chorizo", "Chorizo", "150 g"),
            ingredient("onion", "Onion", "1"),
        ],
        95,
    )
}

pub fn huevos_a_la_mexicana() -> Recipe {
    recipe(
        "themealdb_90007",
        "Huevos a la Mexicana",
        "mexican",
        "breakfast",
        vec![
            ingredient("egg", "Eggs", "4"),
            ingredient("onion", "Onion", "1"),
            ingredient("tomato", "Tomatoes", "2"),
        ],
        60,
    )
}

/// Thai rice dish seasoned with fish sauce and nothing else animal-derived.
pub fn thai_fish_sauce_rice() -> Recipe {
    recipe(
        "themealdb_90008",
        "Thai Fried Rice",
        "thai",
        "stir-fry",
        vec![
            ingredient("rice", "Rice", "2 cups"),
            ingredient("onion", "Onion", "1"),
            ingredient("fish_sauce", "Fish Sauce", "2 tbsp"),
        ],
        90,
    )
}

pub fn thai_basil_rice() -> Recipe {
    recipe(
        "themealdb_90009",
        "Thai Basil Rice",
        "thai",
        "stir-fry",
        vec![
            ingredient("rice", "Rice", "2 cups"),
            ingredient("onion", "Onion", "1"),
            ingredient("basil", "Basil", "1 bunch"),
        ],
        55,
    )
}

pub fn kenyan_plantain_stir_fry() -> Recipe {
    recipe(
        "themealdb_90010",
        "Matoke Stir Fry",
        "kenyan",
        "stir-fry",
        vec![
            ingredient("plantain", "Plantain", "4"),
            ingredient("onion", "Onion", "1"),
        ],
        70,
    )
}

pub fn cuban_plantain_stir_fry() -> Recipe {
    recipe(
        "themealdb_90011",
        "Platanos Salteados",
        "cuban",
        "stir-fry",
        vec![
            ingredient("plantain", "Plantain", "3"),
            ingredient("onion", "Onion", "1"),
        ],
        70,
    )
}

// ── TheMealDB lookup payloads ───────────────────────────────────────────

pub fn meal(id: &str, title: &str, area: &str, category: &str, ingredients: &[&str], instructions: &str) -> Value {
    let mut meal = json!({
        "idMeal": id,
        "strMeal": title,
        "strCategory": category,
        "strArea": area,
        "strInstructions": instructions,
        "strSource": null,
    });
    for n in 1..=20 {
        let (name, measure) = match ingredients.get(n - 1) {
            Some(name) => (json!(name), json!("1 cup")),
            None => (json!(""), json!("")),
        };
        meal[format!("strIngredient{n}")] = name;
        meal[format!("strMeasure{n}")] = measure;
    }
    meal
}

pub fn kung_pao_chicken() -> Value {
    meal(
        "52945",
        "Kung Pao Chicken",
        "Chinese",
        "Chicken",
        &["Chicken", "Soy Sauce", "Garlic", "Ginger"],
        "Marinate the chicken in soy sauce.\nStir fry the chicken in a hot wok until browned.\nAdd garlic and ginger and toss quickly.",
    )
}

/// Chinese chicken dish whose title says nothing about its dish type.
pub fn sesame_chicken() -> Value {
    meal(
        "52946",
        "General Tso's Chicken",
        "Chinese",
        "Chicken",
        &["Chicken", "Soy Sauce", "Sesame Oil"],
        "Coat the chicken pieces in flour.\nDeep fry in hot oil until crisp.\nToss with the sauce.",
    )
}

pub fn chicken_fajitas() -> Value {
    meal(
        "52947",
        "Chicken Fajitas",
        "Mexican",
        "Chicken",
        &["Chicken Breast", "Bell Pepper", "Onion", "Lime", "Corn Tortillas"],
        "Slice the chicken and peppers.\nSear the chicken in a hot pan for 8 minutes.\nAdd the peppers and onion and cook for 5 minutes.\nServe in warm tortillas with lime.",
    )
}

pub fn thai_chicken_only_meal() -> Value {
    meal(
        "52950",
        "Thai Chicken Basil",
        "Thai",
        "Chicken",
        &["Chicken", "Basil", "Fish Sauce"],
        "Stir fry the chicken with basil.\nSeason with fish sauce.",
    )
}

pub fn thai_chicken_shrimp_meal() -> Value {
    meal(
        "52951",
        "Thai Chicken and Shrimp Noodles",
        "Thai",
        "Chicken",
        &["Chicken", "Shrimp", "Fish Sauce", "Rice"],
        "Stir fry the chicken and shrimp.\nAdd the noodles and fish sauce.",
    )
}

/// `count` interchangeable Mexican chicken meals with ids from 60001.
pub fn mexican_chicken_meals(count: usize) -> Vec<Value> {
    (1..=count)
        .map(|n| {
            meal(
                &format!("{}", 60000 + n),
                &format!("Chicken Tinga {n}"),
                "Mexican",
                "Chicken",
                &["Chicken", "Onion", "Tomato"],
                "Simmer the chicken with onion and tomato.\nShred and serve.",
            )
        })
        .collect()
}

pub fn african_plantain_stir_fry() -> Value {
    meal(
        "52960",
        "Plantain Stir Fry",
        "African",
        "Vegetarian",
        &["Plantain", "Onion"],
        "Slice the plantain and onion.\nStir fry in a hot pan until golden.",
    )
}

// ── Spoonacular information payloads ────────────────────────────────────

pub fn spoonacular_enchiladas() -> Value {
    json!({
        "id": 715538,
        "title": "Chicken Enchiladas",
        "cuisines": ["Mexican"],
        "dishTypes": ["main course"],
        "spoonacularScore": 88.0,
        "aggregateLikes": 42,
        "readyInMinutes": 45,
        "servings": 4,
        "extendedIngredients": [
            {"name": "chicken breast", "amount": 2.0, "unit": ""},
            {"name": "corn tortillas", "amount": 8.0, "unit": ""},
            {"name": "onion", "amount": 1.0, "unit": ""}
        ],
        "analyzedInstructions": [{"steps": [
            {"number": 1, "step": "Poach and shred the chicken."},
            {"number": 2, "step": "Roll in tortillas and bake with sauce."}
        ]}]
    })
}

/// Well-formed but rated below the quality gate.
pub fn spoonacular_low_rated() -> Value {
    json!({
        "id": 1001,
        "title": "Sad Chicken",
        "cuisines": ["Mexican"],
        "spoonacularScore": 20.0,
        "aggregateLikes": 0,
        "readyInMinutes": 30,
        "extendedIngredients": [
            {"name": "chicken", "amount": 1.0, "unit": "lb"},
            {"name": "onion", "amount": 1.0, "unit": ""},
            {"name": "tomato", "amount": 1.0, "unit": ""}
        ]
    })
}
