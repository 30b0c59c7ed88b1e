use super::{error::TypeError, schema::NewIngredient};

/*
Ingredient seed file (CSV)

name,measurement_unit          <- optional header
абрикосовое варенье,г
"соль, крупная",г              <- quoted names may hold commas

The unit is always the last field, so only the final comma splits a line.
*/

pub fn parse_ingredient_csv(data: &str) -> Result<Vec<NewIngredient>, TypeError> {
    let mut ingredients = vec![];

    for (n, line) in data.lines().enumerate() {
        let line = line.trim().trim_start_matches('\u{feff}');
        if line.is_empty() {
            continue;
        }

        let (name, unit) = match line.rsplit_once(',') {
            Some(fields) => fields,
            None => {
                return Err(TypeError::new(&format!(
                    "Invalid syntax; line {} has no unit",
                    n + 1
                )))
            }
        };
        let name = unquote(name);
        let unit = unquote(unit);

        if n == 0 && name == "name" && unit == "measurement_unit" {
            continue;
        }
        if name.is_empty() || unit.is_empty() {
            return Err(TypeError::new(&format!(
                "Invalid syntax; line {} has an empty field",
                n + 1
            )));
        }

        ingredients.push(NewIngredient {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
        });
    }

    Ok(ingredients)
}

fn unquote(field: &str) -> String {
    let field = field.trim();
    match field.strip_prefix('"').and_then(|f| f.strip_suffix('"')) {
        Some(inner) => inner.replace("\"\"", "\""),
        None => field.to_string(),
    }
}
