//! Drinks on the menu and where they are kept.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub color: String,
    pub parts: u32,
}

/// A menu item. Titles are unique across the menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drink {
    pub id: u64,
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

/// Public view of a drink: the recipe without ingredient names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortDrink {
    pub id: u64,
    pub title: String,
    pub recipe: Vec<ShortIngredient>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortIngredient {
    pub color: String,
    pub parts: u32,
}

impl Drink {
    pub fn short(&self) -> ShortDrink {
        ShortDrink {
            id: self.id,
            title: self.title.clone(),
            recipe: self
                .recipe
                .iter()
                .map(|ingredient| ShortIngredient {
                    color: ingredient.color.clone(),
                    parts: ingredient.parts,
                })
                .collect(),
        }
    }

    /// Full view of a drink, for callers allowed to see the recipe.
    pub fn long(&self) -> &Drink {
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDrink {
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

/// Fields to change on an existing drink; `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrinkPatch {
    pub title: Option<String>,
    pub recipe: Option<Vec<Ingredient>>,
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("a drink titled {0:?} already exists")]
    DuplicateTitle(String),
}

#[async_trait]
pub trait DrinkStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Drink>, StoreError>;

    async fn get(&self, id: u64) -> Result<Option<Drink>, StoreError>;

    async fn insert(&self, drink: NewDrink) -> Result<Drink, StoreError>;

    /// Returns `None` if there is no drink with this id.
    async fn update(&self, id: u64, patch: DrinkPatch) -> Result<Option<Drink>, StoreError>;

    /// Returns the removed drink, or `None` if there was none with this id.
    async fn delete(&self, id: u64) -> Result<Option<Drink>, StoreError>;
}

#[derive(Default)]
struct Menu {
    last_id: u64,
    drinks: BTreeMap<u64, Drink>,
}

impl Menu {
    fn title_taken(&self, title: &str, except: Option<u64>) -> bool {
        self.drinks
            .values()
            .any(|drink| drink.title == title && Some(drink.id) != except)
    }
}

/// Process-local store. Ids are assigned in ascending order and never reused.
#[derive(Default)]
pub struct InMemoryDrinkStore {
    menu: RwLock<Menu>,
}

impl InMemoryDrinkStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DrinkStore for InMemoryDrinkStore {
    async fn list(&self) -> Result<Vec<Drink>, StoreError> {
        Ok(self.menu.read().drinks.values().cloned().collect())
    }

    async fn get(&self, id: u64) -> Result<Option<Drink>, StoreError> {
        Ok(self.menu.read().drinks.get(&id).cloned())
    }

    async fn insert(&self, drink: NewDrink) -> Result<Drink, StoreError> {
        let mut menu = self.menu.write();
        if menu.title_taken(&drink.title, None) {
            return Err(StoreError::DuplicateTitle(drink.title));
        }

        menu.last_id += 1;
        let drink = Drink {
            id: menu.last_id,
            title: drink.title,
            recipe: drink.recipe,
        };
        menu.drinks.insert(drink.id, drink.clone());
        Ok(drink)
    }

    async fn update(&self, id: u64, patch: DrinkPatch) -> Result<Option<Drink>, StoreError> {
        let mut menu = self.menu.write();
        if !menu.drinks.contains_key(&id) {
            return Ok(None);
        }
        if let Some(title) = &patch.title {
            if menu.title_taken(title, Some(id)) {
                return Err(StoreError::DuplicateTitle(title.clone()));
            }
        }

        let Some(drink) = menu.drinks.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = patch.title {
            drink.title = title;
        }
        if let Some(recipe) = patch.recipe {
            drink.recipe = recipe;
        }
        Ok(Some(drink.clone()))
    }

    async fn delete(&self, id: u64) -> Result<Option<Drink>, StoreError> {
        Ok(self.menu.write().drinks.remove(&id))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn water() -> NewDrink {
        NewDrink {
            title: "water".to_string(),
            recipe: vec![Ingredient {
                name: "water".to_string(),
                color: "blue".to_string(),
                parts: 1,
            }],
        }
    }

    #[test]
    fn test_short_view_hides_ingredient_names() {
        let drink = Drink {
            id: 3,
            title: "matcha shake".to_string(),
            recipe: vec![
                Ingredient {
                    name: "milk".to_string(),
                    color: "grey".to_string(),
                    parts: 1,
                },
                Ingredient {
                    name: "matcha".to_string(),
                    color: "green".to_string(),
                    parts: 3,
                },
            ],
        };

        assert_eq!(
            serde_json::to_value(drink.short()).unwrap(),
            serde_json::json!({
                "id": 3,
                "title": "matcha shake",
                "recipe": [{"color": "grey", "parts": 1}, {"color": "green", "parts": 3}],
            })
        );
        assert_eq!(
            serde_json::to_value(drink.long()).unwrap()["recipe"][1],
            serde_json::json!({"name": "matcha", "color": "green", "parts": 3})
        );
    }

    #[tokio::test]
    async fn test_insert_assigns_ascending_ids() {
        let store = InMemoryDrinkStore::new();

        let first = store.insert(water()).await.unwrap();
        let second = store
            .insert(NewDrink {
                title: "flat white".to_string(),
                ..water()
            })
            .await
            .unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(store.list().await.unwrap(), vec![first, second]);
    }

    #[tokio::test]
    async fn test_duplicate_title_rejected() {
        let store = InMemoryDrinkStore::new();
        store.insert(water()).await.unwrap();

        assert!(matches!(
            store.insert(water()).await,
            Err(StoreError::DuplicateTitle(title)) if title == "water"
        ));
    }

    #[tokio::test]
    async fn test_update_keeps_untouched_fields() {
        let store = InMemoryDrinkStore::new();
        let drink = store.insert(water()).await.unwrap();

        let updated = store
            .update(
                drink.id,
                DrinkPatch {
                    title: Some("sparkling water".to_string()),
                    recipe: None,
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.title, "sparkling water");
        assert_eq!(updated.recipe, drink.recipe);
        assert_eq!(store.get(drink.id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_update_may_keep_own_title() {
        let store = InMemoryDrinkStore::new();
        let drink = store.insert(water()).await.unwrap();

        let patch = DrinkPatch {
            title: Some("water".to_string()),
            recipe: None,
        };
        assert!(store.update(drink.id, patch).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_and_delete_unknown_id() {
        let store = InMemoryDrinkStore::new();

        assert_eq!(store.update(7, DrinkPatch::default()).await.unwrap(), None);
        assert_eq!(store.delete(7).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_deleted_ids_are_not_reused() {
        let store = InMemoryDrinkStore::new();
        let drink = store.insert(water()).await.unwrap();

        assert_eq!(store.delete(drink.id).await.unwrap(), Some(drink));
        assert_eq!(store.insert(water()).await.unwrap().id, 2);
    }
}
