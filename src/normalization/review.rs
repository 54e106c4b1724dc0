use serde_json::Value;

use super::json::{render_value, ValueExt};

/// Flat projection of a review summary payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewFields {
    pub rating_average: Value,
    pub reviews_count: Value,
    /// `"1:count_5,percent_10;3:count_2,percent_4"`, or `""` when no star has data.
    pub stars: String,
}

impl Default for ReviewFields {
    fn default() -> Self {
        parse_review_fields(&Value::Null)
    }
}

pub fn parse_review_fields(payload: &Value) -> ReviewFields {
    let summary = payload.field("rating_summary");
    ReviewFields {
        rating_average: first_present(payload.field("rating_average"), summary.field("rating_average")),
        reviews_count: first_present(payload.field("reviews_count"), summary.field("reviews_count")),
        stars: format_stars(star_table(payload)),
    }
}

fn first_present(top: &Value, nested: &Value) -> Value {
    if top.is_null() {
        nested.clone()
    } else {
        top.clone()
    }
}

/// Top-level `stars` when it is an object, else `rating_summary.stars`.
fn star_table(payload: &Value) -> &Value {
    let top = payload.field("stars");
    if top.is_object() {
        top
    } else {
        payload.field("rating_summary").field("stars")
    }
}

fn format_stars(stars: &Value) -> String {
    if !stars.is_object() {
        return String::new();
    }
    let parts: Vec<String> = (1..=5)
        .filter_map(|star| {
            let entry = stars.field(&star.to_string());
            match entry {
                Value::Null => None,
                Value::Object(_) => {
                    let count = entry.field("count");
                    let percent = entry.field("percent");
                    if count.is_null() && percent.is_null() {
                        None
                    } else {
                        Some(format!(
                            "{star}:count_{},percent_{}",
                            render_value(count),
                            render_value(percent)
                        ))
                    }
                }
                bare => Some(format!("{star}:count_{},percent_None", render_value(bare))),
            }
        })
        .collect();
    parts.join(";")
}
