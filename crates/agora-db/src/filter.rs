use rusqlite::params_from_iter;
use rusqlite::types::Value;

use crate::models::PostRow;
use crate::queries::{placeholders, post_row};
use crate::{Database, Result};

/// Predicates for the post listing. Every field left empty is omitted;
/// the ones present are combined with AND.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    /// Substring that must appear in the title or the content.
    pub search: String,
    /// Post must be tagged with at least one of these categories.
    pub category_ids: Vec<i64>,
    /// Post must currently be liked (not disliked) by this user.
    pub liked_by: Option<i64>,
}

impl PostFilter {
    /// Build the WHERE clause and its bound values. Only `?` placeholders
    /// carry caller input; the SQL text itself is fixed.
    fn where_clause(&self) -> (String, Vec<Value>) {
        let mut conditions: Vec<String> = Vec::new();
        let mut args: Vec<Value> = Vec::new();

        if !self.search.is_empty() {
            conditions.push("(instr(p.title, ?) > 0 OR instr(p.content, ?) > 0)".into());
            args.push(Value::Text(self.search.clone()));
            args.push(Value::Text(self.search.clone()));
        }

        if !self.category_ids.is_empty() {
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM post_categories pc
                         WHERE pc.post_id = p.id AND pc.category_id IN ({}))",
                placeholders(self.category_ids.len())
            ));
            args.extend(self.category_ids.iter().map(|id| Value::Integer(*id)));
        }

        if let Some(user_id) = self.liked_by {
            conditions.push(
                "EXISTS (SELECT 1 FROM post_reactions pr
                         WHERE pr.post_id = p.id AND pr.user_id = ? AND pr.is_like = 1)"
                    .into(),
            );
            args.push(Value::Integer(user_id));
        }

        if conditions.is_empty() {
            (String::new(), args)
        } else {
            (format!("WHERE {}", conditions.join(" AND ")), args)
        }
    }
}

impl Database {
    /// Posts matching `filter`, newest first; equal timestamps keep insertion order.
    pub fn filter_posts(&self, filter: &PostFilter) -> Result<Vec<PostRow>> {
        let (where_clause, args) = filter.where_clause();
        let sql = format!(
            "SELECT p.id, p.user_id, u.username, p.title, p.content, p.created_at
             FROM posts p
             JOIN users u ON p.user_id = u.id
             {where_clause}
             ORDER BY p.created_at DESC, p.id ASC"
        );

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(args.iter()), post_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}
