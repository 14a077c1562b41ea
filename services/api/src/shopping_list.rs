//! Aggregated shopping list for the recipes in a user's cart

use std::collections::HashMap;

use crate::models::recipe::CartLine;

pub const FILENAME: &str = "shopping_cart.txt";
pub const HEADER: &str = "Shopping list";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub total: i64,
}

/// Sum amounts per ingredient, ordered by name then unit
pub fn aggregate(lines: impl IntoIterator<Item = CartLine>) -> Vec<ShoppingListItem> {
    let mut totals: HashMap<i64, ShoppingListItem> = HashMap::new();
    for line in lines {
        totals
            .entry(line.ingredient_id)
            .or_insert_with(|| ShoppingListItem {
                name: line.name,
                measurement_unit: line.measurement_unit,
                total: 0,
            })
            .total += i64::from(line.amount);
    }

    let mut items: Vec<(i64, ShoppingListItem)> = totals.into_iter().collect();
    items.sort_by(|(a_id, a), (b_id, b)| {
        a.name
            .cmp(&b.name)
            .then_with(|| a.measurement_unit.cmp(&b.measurement_unit))
            .then_with(|| a_id.cmp(b_id))
    });
    items.into_iter().map(|(_, item)| item).collect()
}

/// Plain-text body of the downloadable list
pub fn render(items: &[ShoppingListItem]) -> String {
    let mut body = format!("{}\n", HEADER);
    for item in items {
        body.push_str(&format!(
            "{}: {} ({})\n",
            item.name, item.total, item.measurement_unit
        ));
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(ingredient_id: i64, name: &str, unit: &str, amount: i32) -> CartLine {
        CartLine {
            ingredient_id,
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn test_amounts_are_summed_per_ingredient() {
        // recipe A: flour 200 g, egg 2 pc; recipe B: flour 100 g
        let items = aggregate(vec![
            line(1, "flour", "g", 200),
            line(2, "egg", "pc", 2),
            line(1, "flour", "g", 100),
        ]);

        assert_eq!(
            items,
            vec![
                ShoppingListItem {
                    name: "egg".to_string(),
                    measurement_unit: "pc".to_string(),
                    total: 2,
                },
                ShoppingListItem {
                    name: "flour".to_string(),
                    measurement_unit: "g".to_string(),
                    total: 300,
                },
            ]
        );
        assert_eq!(render(&items), "Shopping list\negg: 2 (pc)\nflour: 300 (g)\n");
    }

    #[test]
    fn test_same_name_different_unit_stays_separate() {
        let items = aggregate(vec![line(1, "salt", "g", 5), line(2, "salt", "pinch", 1)]);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].measurement_unit, "g");
        assert_eq!(items[1].measurement_unit, "pinch");
    }

    #[test]
    fn test_empty_cart_is_header_only() {
        assert_eq!(render(&aggregate(Vec::new())), "Shopping list\n");
    }
}
