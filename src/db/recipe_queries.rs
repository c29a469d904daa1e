use sqlx::sqlite::SqliteRow;
use sqlx::types::Json;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection};

use crate::models::recipe::{Recipe, RecipeIngredient};

const RECIPE_COLUMNS: &str = "id, title, cuisine, dish_type, ingredients, instructions, \
     prep_time, cook_time, servings, source, quality_score, times_served";

/// A cached recipe plus the number of requested ingredient slugs it contains.
#[derive(Debug, Clone)]
pub struct RecipeMatch {
    pub recipe: Recipe,
    pub ingredient_matches: i64,
}

fn recipe_from_row(row: &SqliteRow) -> Result<Recipe, sqlx::Error> {
    let Json(ingredients): Json<Vec<RecipeIngredient>> = row.try_get("ingredients")?;
    let Json(instructions): Json<Vec<String>> = row.try_get("instructions")?;
    let quality: i64 = row.try_get("quality_score")?;

    Ok(Recipe {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        cuisine: row.try_get("cuisine")?,
        dish_type: row.try_get("dish_type")?,
        ingredients,
        instructions,
        prep_time: row.try_get("prep_time")?,
        cook_time: row.try_get("cook_time")?,
        servings: row.try_get("servings")?,
        source: row.try_get("source")?,
        quality_score: quality.clamp(0, 100) as u8,
        times_served: row.try_get("times_served")?,
    })
}

/// Insert a recipe and its ingredient index rows. Returns `false` without
/// touching anything when the id already exists.
///
/// Run inside a transaction so the index never diverges from the recipe row.
pub async fn insert_recipe(conn: &mut SqliteConnection, recipe: &Recipe) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO recipes
            (id, title, cuisine, dish_type, ingredients, instructions,
             prep_time, cook_time, servings, source, quality_score, times_served)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&recipe.id)
    .bind(&recipe.title)
    .bind(&recipe.cuisine)
    .bind(&recipe.dish_type)
    .bind(Json(&recipe.ingredients))
    .bind(Json(&recipe.instructions))
    .bind(recipe.prep_time)
    .bind(recipe.cook_time)
    .bind(recipe.servings)
    .bind(&recipe.source)
    .bind(i64::from(recipe.quality_score))
    .bind(recipe.times_served)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(false);
    }

    for slug in recipe.ingredient_slugs().filter(|s| !s.is_empty()) {
        sqlx::query(
            "INSERT OR IGNORE INTO recipe_ingredients (recipe_id, ingredient_slug) VALUES (?, ?)",
        )
        .bind(&recipe.id)
        .bind(slug)
        .execute(&mut *conn)
        .await?;
    }

    Ok(true)
}

/// Get a recipe by ID
pub async fn get_recipe(conn: &mut SqliteConnection, id: &str) -> Result<Option<Recipe>, sqlx::Error> {
    let sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = ?");
    let row = sqlx::query(&sql).bind(id).fetch_optional(&mut *conn).await?;
    row.as_ref().map(recipe_from_row).transpose()
}

/// Recipes of a cuisine (and dish type, when given) containing at least one
/// slug from every ingredient group. Ordered by quality then popularity.
pub async fn find_exact(
    conn: &mut SqliteConnection,
    cuisine: &str,
    dish_type: Option<&str>,
    ingredient_groups: &[Vec<String>],
    limit: u32,
) -> Result<Vec<Recipe>, sqlx::Error> {
    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {RECIPE_COLUMNS} FROM recipes r WHERE r.cuisine = "));
    qb.push_bind(cuisine);

    if let Some(dish_type) = dish_type {
        qb.push(" AND r.dish_type = ").push_bind(dish_type);
    }

    for group in ingredient_groups.iter().filter(|g| !g.is_empty()) {
        qb.push(
            " AND EXISTS (SELECT 1 FROM recipe_ingredients ri \
             WHERE ri.recipe_id = r.id AND ri.ingredient_slug IN (",
        );
        let mut slugs = qb.separated(", ");
        for slug in group {
            slugs.push_bind(slug.as_str());
        }
        slugs.push_unseparated("))");
    }

    qb.push(" ORDER BY r.quality_score DESC, r.times_served DESC, r.id LIMIT ")
        .push_bind(i64::from(limit));

    let rows = qb.build().fetch_all(&mut *conn).await?;
    rows.iter().map(recipe_from_row).collect()
}

/// Recipes of a cuisine sharing any of the given slugs, ranked by overlap
/// count then quality.
pub async fn find_partial(
    conn: &mut SqliteConnection,
    cuisine: &str,
    dish_type: Option<&str>,
    slugs: &[String],
    limit: u32,
) -> Result<Vec<RecipeMatch>, sqlx::Error> {
    if slugs.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {RECIPE_COLUMNS}, COUNT(DISTINCT ri.ingredient_slug) AS ingredient_matches \
         FROM recipes r JOIN recipe_ingredients ri ON ri.recipe_id = r.id \
         AND ri.ingredient_slug IN ("
    ));
    let mut in_list = qb.separated(", ");
    for slug in slugs {
        in_list.push_bind(slug.as_str());
    }
    in_list.push_unseparated(") WHERE r.cuisine = ");
    qb.push_bind(cuisine);

    if let Some(dish_type) = dish_type {
        qb.push(" AND r.dish_type = ").push_bind(dish_type);
    }

    qb.push(" GROUP BY r.id ORDER BY ingredient_matches DESC, r.quality_score DESC, r.id LIMIT ")
        .push_bind(i64::from(limit));

    let rows = qb.build().fetch_all(&mut *conn).await?;
    rows.iter()
        .map(|row| {
            Ok(RecipeMatch {
                recipe: recipe_from_row(row)?,
                ingredient_matches: row.try_get("ingredient_matches")?,
            })
        })
        .collect()
}

/// Increment the popularity counter and return the updated row in the same
/// statement. `None` if the recipe no longer exists.
pub async fn serve_recipe(conn: &mut SqliteConnection, id: &str) -> Result<Option<Recipe>, sqlx::Error> {
    let sql = format!(
        "UPDATE recipes SET times_served = times_served + 1, \
         updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now') \
         WHERE id = ? RETURNING {RECIPE_COLUMNS}"
    );
    let row = sqlx::query(&sql).bind(id).fetch_optional(&mut *conn).await?;
    row.as_ref().map(recipe_from_row).transpose()
}

/// Dish types present for a cuisine, most common first.
pub async fn dish_type_counts(
    conn: &mut SqliteConnection,
    cuisine: &str,
    exclude: Option<&str>,
) -> Result<Vec<(String, i64)>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT dish_type, COUNT(*) AS recipe_count
        FROM recipes
        WHERE cuisine = ? AND dish_type != '' AND dish_type != COALESCE(?, '')
        GROUP BY dish_type
        ORDER BY recipe_count DESC, dish_type
        "#,
    )
    .bind(cuisine)
    .bind(exclude)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter()
        .map(|row| Ok((row.try_get("dish_type")?, row.try_get("recipe_count")?)))
        .collect()
}

pub async fn count_recipes(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let row = sqlx::query("SELECT COUNT(*) AS total FROM recipes")
        .fetch_one(&mut *conn)
        .await?;
    row.try_get("total")
}

/// Page through the whole cache in id order.
pub async fn list_recipes(
    conn: &mut SqliteConnection,
    after_id: Option<&str>,
    limit: u32,
) -> Result<Vec<Recipe>, sqlx::Error> {
    let sql = format!(
        "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id > COALESCE(?, '') ORDER BY id LIMIT ?"
    );
    let rows = sqlx::query(&sql)
        .bind(after_id)
        .bind(i64::from(limit))
        .fetch_all(&mut *conn)
        .await?;
    rows.iter().map(recipe_from_row).collect()
}

pub async fn update_quality_score(
    conn: &mut SqliteConnection,
    id: &str,
    score: u8,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE recipes
        SET quality_score = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
        WHERE id = ? AND quality_score != ?
        "#,
    )
    .bind(i64::from(score))
    .bind(id)
    .bind(i64::from(score))
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}
