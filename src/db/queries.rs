// Small SELECT builder for the read side. All the
// values go through "?" placeholders, only column
// names, clauses and numbers end up in the string.

use std::fmt;

pub enum Order {
  Asc,
  Desc
}

pub struct OrderBy {
  pub order: Order,
  pub field: String
}

impl OrderBy {
  pub fn new(order: Order, field: &str) -> Self {
    OrderBy {
      order,
      field: String::from(field)
    }
  }

  pub fn asc(field: &str) -> Self {
    Self::new(Order::Asc, field)
  }

  pub fn desc(field: &str) -> Self {
    Self::new(Order::Desc, field)
  }
}

// Decided to use the "builder pattern" they talk
// about in Rust docs for query building.
// The "q_" in front of field names is because
// "where" is a reserved keyword in Rust.
pub struct Query {
  q_fields: Vec<String>,
  q_from: Vec<String>,
  q_join: Vec<String>,
  q_where: Vec<String>,
  q_group: Vec<String>,
  q_order: Vec<OrderBy>,
  limit: Option<i64>,
  offset: Option<i64>,
}

fn to_strings(values: &[&str]) -> Vec<String> {
  values.iter().map(|v| v.to_string()).collect()
}

impl Query {

  pub fn select(fields: &[&str], from: &[&str]) -> Self {
    Query {
      q_fields: to_strings(fields),
      q_from: to_strings(from),
      q_join: Vec::new(),
      q_where: Vec::new(),
      q_group: Vec::new(),
      q_order: Vec::new(),
      limit: None,
      offset: None
    }
  }

  // Inner join, e.g. "blog_posts ON blog_posts.category_id = categories.id"
  pub fn join(mut self, join: &str) -> Self {
    self.q_join.push(String::from(join));
    self
  }

  // Clauses are all glued together with AND.
  pub fn where_and(mut self, q_where: &[&str]) -> Self {
    self.q_where.extend(to_strings(q_where));
    self
  }

  pub fn group_by(mut self, fields: &[&str]) -> Self {
    self.q_group.extend(to_strings(fields));
    self
  }

  // Can be called more than once, the first call is
  // the main sort and the next ones break ties.
  pub fn order(mut self, order: OrderBy) -> Self {
    self.q_order.push(order);
    self
  }

  pub fn limit(mut self, limit: i64) -> Self {
    self.limit = Some(limit);
    self
  }

  pub fn offset(mut self, offset: i64) -> Self {
    self.offset = Some(offset);
    self
  }

}

// Creating the query string is done by implementing
// the Display trait, which gives us to_string().
impl fmt::Display for Query {

  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "SELECT {} FROM {} ",
      self.q_fields.join(","),
      self.q_from.join(",")
    )?;
    for join in &self.q_join {
      write!(f, "JOIN {} ", join)?;
    }
    if !self.q_where.is_empty() {
      write!(f, "WHERE {} ", self.q_where.join(" AND "))?;
    }
    if !self.q_group.is_empty() {
      write!(f, "GROUP BY {} ", self.q_group.join(","))?;
    }
    if !self.q_order.is_empty() {
      let orders: Vec<String> = self.q_order.iter()
        .map(|o| format!(
          "{} {}",
          o.field,
          match o.order {
            Order::Asc => "ASC",
            Order::Desc => "DESC"
          }
        ))
        .collect();
      write!(f, "ORDER BY {} ", orders.join(","))?;
    }
    // SQLite doesn't allow OFFSET without LIMIT.
    if let Some(lim) = self.limit {
      write!(f, "LIMIT {} ", lim)?;
      if let Some(off) = self.offset {
        write!(f, "OFFSET {} ", off)?;
      }
    }
    Ok(())
  }

}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn generate_simple_select() {
    let query = Query::select(
      &["my_table.name", "my_table.value"],
      &["my_table"]
    );
    // There's supposed to be an extra space at the end and no space between commas:
    let expected = String::from("SELECT my_table.name,my_table.value FROM my_table ");
    assert_eq!(query.to_string(), expected);
  }

  #[test]
  fn generate_full_select() {
    let query = Query::select(
      &["my_table_1.name", "COUNT(my_table_2.id)"],
      &["my_table_1"]
    )
      .join("my_table_2 ON my_table_2.parent_id = my_table_1.id")
      .where_and(&["my_table_1.id = ?", "my_table_2.visible = 1"])
      .group_by(&["my_table_1.id", "my_table_1.name"])
      .order(OrderBy::desc("name"))
      .order(OrderBy::asc("my_table_1.id"))
      .limit(10)
      .offset(20);
    let expected = String::from(
      "SELECT my_table_1.name,COUNT(my_table_2.id) FROM my_table_1 \
      JOIN my_table_2 ON my_table_2.parent_id = my_table_1.id \
      WHERE my_table_1.id = ? AND my_table_2.visible = 1 \
      GROUP BY my_table_1.id,my_table_1.name \
      ORDER BY name DESC,my_table_1.id ASC LIMIT 10 OFFSET 20 ");
    assert_eq!(query.to_string(), expected);
  }

  #[test]
  fn offset_is_ignored_without_limit() {
    let query = Query::select(&["id"], &["t"]).offset(5);
    assert_eq!("SELECT id FROM t ", query.to_string());
  }
}
