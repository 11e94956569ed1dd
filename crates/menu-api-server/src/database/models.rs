use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A menu row. `qr_url` is only ever written by the QR sync workflow.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Menu {
    pub id: i32,
    #[serde(rename = "nombre")]
    #[sqlx(rename = "nombre")]
    pub name: String,
    pub status: Option<String>,
    #[serde(rename = "codigo_qr")]
    #[sqlx(rename = "codigo_qr")]
    pub qr_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    pub id: i32,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion")]
    pub description: Option<String>,
    #[serde(rename = "precio")]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuWithDishes {
    #[serde(flatten)]
    pub menu: Menu,
    #[serde(rename = "platos")]
    pub dishes: Vec<Dish>,
}

/// One row of `menu LEFT JOIN plato`. Dish columns are all null when the
/// menu has no dishes.
#[derive(Debug, Clone, FromRow)]
pub struct MenuDishRow {
    pub id: i32,
    pub nombre: String,
    pub status: Option<String>,
    pub codigo_qr: Option<String>,
    pub plato_id: Option<i32>,
    pub plato_nombre: Option<String>,
    pub descripcion: Option<String>,
    pub precio: Option<f64>,
}

impl MenuWithDishes {
    /// Folds joined rows into a single menu. Returns `None` for an empty result set.
    pub fn from_rows(rows: Vec<MenuDishRow>) -> Option<Self> {
        let first = rows.first()?;
        let menu = Menu {
            id: first.id,
            name: first.nombre.clone(),
            status: first.status.clone(),
            qr_url: first.codigo_qr.clone(),
        };

        let dishes = rows
            .into_iter()
            .filter_map(|row| {
                // the null-extended row of a dish-less menu has no plato_id
                let id = row.plato_id?;
                Some(Dish {
                    id,
                    name: row.plato_nombre.unwrap_or_default(),
                    description: row.descripcion,
                    price: row.precio,
                })
            })
            .collect();

        Some(Self { menu, dishes })
    }
}
