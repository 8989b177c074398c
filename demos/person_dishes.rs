//! Builds people with their identities and favourite dishes from JSON Lines rows.
//!
//! Run with `cargo run --example person_dishes [rows.jsonl]`. Without an argument a small
//! built-in menu is used. Rows must be ordered by `id`.

use rowweave::driver::try_feed;
use rowweave::json::read_json_lines;
use rowweave::node::{Node, RootNode};
use rowweave::shared::{Shared, shared};
use rowweave::sink::Collector;
use rowweave::BoxError;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use tracing::info;

const MENU: &str = r#"
{"id": 100, "first_name": "Joe", "last_name": "Slim", "dish": "Chicken", "identity_type": "Driver's License", "identity_value": "B1234567"}
{"id": 100, "first_name": "Joe", "last_name": "Slim", "dish": "Chicken", "identity_type": "SSN", "identity_value": "123-45-678"}
{"id": 101, "first_name": "Bob", "last_name": "Portly", "dish": "Fish", "identity_type": "Driver's License", "identity_value": "C1234567"}
{"id": 101, "first_name": "Bob", "last_name": "Portly", "dish": "Spinach", "identity_type": "Driver's License", "identity_value": "C1234567"}
{"id": 101, "first_name": "Bob", "last_name": "Portly", "dish": "Steak", "identity_type": "Driver's License", "identity_value": "C1234567"}
"#;

#[derive(Debug, Deserialize)]
struct MenuRow {
  id: u64,
  first_name: String,
  last_name: String,
  dish: String,
  identity_type: String,
  identity_value: String,
}

#[derive(Debug)]
struct Person {
  id: u64,
  name: String,
  identities: Vec<(String, String)>,
  dishes: Vec<String>,
}

fn build_tree(people: &Collector<Shared<Person>>) -> RootNode<Shared<Person>, MenuRow, u64> {
  let identities = Node::new(
    |row: &MenuRow| row.identity_type.clone(),
    |identity: &(String, String)| identity.0.clone(),
    |row: &MenuRow| (row.identity_type.clone(), row.identity_value.clone()),
  )
  .with_name("identities")
  .with_attach(|person: &mut Shared<Person>, identity: &(String, String)| {
    person.borrow_mut().identities.push(identity.clone())
  });

  let dishes = Node::new(
    |row: &MenuRow| row.dish.clone(),
    |dish: &String| dish.clone(),
    |row: &MenuRow| row.dish.clone(),
  )
  .with_name("dishes")
  .with_attach(|person: &mut Shared<Person>, dish: &String| {
    person.borrow_mut().dishes.push(dish.clone())
  });

  RootNode::new(
    |row: &MenuRow| row.id,
    |person: &Shared<Person>| person.borrow().id,
    |row: &MenuRow| {
      shared(Person {
        id: row.id,
        name: format!("{} {}", row.first_name, row.last_name),
        identities: Vec::new(),
        dishes: Vec::new(),
      })
    },
  )
  .with_name("people")
  .with_prev_emitter(people.sink())
  .with_child(identities)
  .with_child(dishes)
}

fn open_rows() -> Result<Box<dyn BufRead>, BoxError> {
  match std::env::args().nth(1) {
    Some(path) => Ok(Box::new(BufReader::new(File::open(path)?))),
    None => Ok(Box::new(MENU.as_bytes())),
  }
}

fn main() -> Result<(), BoxError> {
  tracing_subscriber::fmt()
    .with_max_level(tracing::Level::DEBUG)
    .init();

  let people = Collector::new();
  let mut root = build_tree(&people);
  let rows = try_feed(&mut root, read_json_lines::<MenuRow, _>(open_rows()?))?;
  info!(rows, people = people.len(), "menu accumulated");

  for person in people.take() {
    let person = person.borrow();
    println!(
      "{} {}: dishes={:?} identities={:?}",
      person.id, person.name, person.dishes, person.identities
    );
  }
  Ok(())
}
