use cafe_engine::validation::{MenuForm, TableForm};
use cucumber::{gherkin::Step, given};
use serde_json::json;

use crate::cucumber::{cafe_world::CafeSystem, CafeWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut CafeWorld) {
    let system = CafeSystem::new().await;
    world.system = Some(system);
}

#[given("the menu")]
async fn menu_table(world: &mut CafeWorld, step: &Step) {
    let rows = step.table.as_ref().expect("The menu step needs a data table").rows.clone();
    for row in rows.into_iter().skip(1) {
        let form = MenuForm {
            name: row[0].clone(),
            description: format!("{} from the kitchen", row[0]),
            price: Some(json!(row[1])),
            discount: Some(json!(row[2])),
            category: row[3].clone(),
            image_url: None,
            is_available: Some(true),
        };
        let menu = world.system().menus.create_menu(form).await.expect("Error creating menu");
        world.system_mut().menu_ids.insert(menu.name.clone(), menu);
    }
}

#[given(expr = "a table {word} seating {int}")]
async fn add_table(world: &mut CafeWorld, name: String, capacity: i64) {
    let form = TableForm { name: name.clone(), capacity: Some(json!(capacity)), ..Default::default() };
    let table = world.system().tables.create_table(form).await.expect("Error creating table");
    world.system_mut().table_ids.insert(name, table);
}
