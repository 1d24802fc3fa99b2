use std::collections::HashMap;
use std::sync::Arc;

use agora_db::models::{CategoryRow, PostRow};
use agora_db::{Database, PostFilter};
use agora_types::models::{Category, CommentView, PostDetail, PostView, ReactionCounts};
use agora_types::reactions::TargetKind;
use agora_types::{CategoryId, PostId, UserId};

use crate::error::ForumError;
use crate::reactions::ReactionEngine;

/// Read side of the board: the filtered post list and single post pages.
#[derive(Clone)]
pub struct PostQuery {
    db: Arc<Database>,
    reactions: ReactionEngine,
}

impl PostQuery {
    pub fn new(db: Arc<Database>, reactions: ReactionEngine) -> Self {
        Self { db, reactions }
    }

    /// Posts matching every supplied predicate, newest first.
    ///
    /// An empty `search` or `category_ids` and a `None` `liked_by` each drop
    /// their predicate. Each post comes back with its author, its full
    /// category list and its like/dislike counts.
    pub fn list_posts(
        &self,
        search: &str,
        category_ids: &[CategoryId],
        liked_by: Option<UserId>,
    ) -> Result<Vec<PostView>, ForumError> {
        let filter = PostFilter {
            search: search.to_string(),
            category_ids: category_ids.to_vec(),
            liked_by,
        };
        let rows = self.db.filter_posts(&filter)?;
        self.hydrate(rows)
    }

    pub fn get_post(&self, post_id: PostId) -> Result<PostDetail, ForumError> {
        let row = self
            .db
            .get_post(post_id)?
            .ok_or_else(|| ForumError::NotFound("Post".into()))?;
        let post = self
            .hydrate(vec![row])?
            .pop()
            .ok_or_else(|| ForumError::NotFound("Post".into()))?;

        let comment_rows = self.db.get_comments(post_id)?;
        let ids: Vec<i64> = comment_rows.iter().map(|c| c.id).collect();
        let counts = self.reactions.count_many(TargetKind::Comment, &ids)?;

        let comments = comment_rows
            .into_iter()
            .map(|c| {
                let ReactionCounts { likes, dislikes } = counts.get(&c.id).copied().unwrap_or_default();
                CommentView {
                    id: c.id,
                    post_id: c.post_id,
                    author_id: c.user_id,
                    author_username: c.author_username,
                    content: c.content,
                    created_at: c.created_at,
                    likes,
                    dislikes,
                }
            })
            .collect();

        Ok(PostDetail { post, comments })
    }

    pub fn list_categories(&self) -> Result<Vec<Category>, ForumError> {
        Ok(self.db.list_categories()?.into_iter().map(to_category).collect())
    }

    /// Attach categories and counts. One batched fetch of each for the whole
    /// page, then matched back to posts by id.
    fn hydrate(&self, rows: Vec<PostRow>) -> Result<Vec<PostView>, ForumError> {
        if rows.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

        let mut categories: HashMap<i64, Vec<Category>> = HashMap::new();
        for (post_id, cat) in self.db.get_categories_for_posts(&ids)? {
            categories.entry(post_id).or_default().push(to_category(cat));
        }

        let counts = self.reactions.count_many(TargetKind::Post, &ids)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let ReactionCounts { likes, dislikes } = counts.get(&row.id).copied().unwrap_or_default();
                PostView {
                    categories: categories.remove(&row.id).unwrap_or_default(),
                    id: row.id,
                    author_id: row.user_id,
                    author_username: row.author_username,
                    title: row.title,
                    content: row.content,
                    created_at: row.created_at,
                    likes,
                    dislikes,
                }
            })
            .collect())
    }
}

fn to_category(row: CategoryRow) -> Category {
    Category {
        id: row.id,
        name: row.name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_types::reactions::ReactionAction;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 10, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    struct Board {
        db: Arc<Database>,
        query: PostQuery,
        reactions: ReactionEngine,
        alice: i64,
        bob: i64,
    }

    fn board() -> Board {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let reactions = ReactionEngine::new(db.clone());
        let alice = db.create_user("a@x.com", "alice", "h", at(0)).unwrap();
        let bob = db.create_user("b@x.com", "bob", "h", at(0)).unwrap();
        Board {
            query: PostQuery::new(db.clone(), reactions.clone()),
            db,
            reactions,
            alice,
            bob,
        }
    }

    impl Board {
        fn post(&self, author: i64, title: &str, content: &str, cats: &[i64], minute: i64) -> i64 {
            self.db.create_post(author, title, content, cats, at(minute)).unwrap().unwrap()
        }
    }

    fn titles(posts: &[PostView]) -> Vec<&str> {
        posts.iter().map(|p| p.title.as_str()).collect()
    }

    #[test]
    fn composes_search_and_categories() {
        let b = board();
        b.post(b.alice, "xyz first", "body", &[1], 1);
        b.post(b.alice, "second", "has xyz inside", &[2], 2);
        b.post(b.bob, "third", "nothing", &[3], 3);
        b.post(b.bob, "fourth", "xyz again", &[3, 4], 4);

        let all = b.query.list_posts("", &[], None).unwrap();
        assert_eq!(titles(&all), vec!["fourth", "third", "second", "xyz first"]);

        let text = b.query.list_posts("xyz", &[], None).unwrap();
        assert_eq!(titles(&text), vec!["fourth", "second", "xyz first"]);

        let cats = b.query.list_posts("", &[2, 3], None).unwrap();
        assert_eq!(titles(&cats), vec!["fourth", "third", "second"]);

        let both = b.query.list_posts("xyz", &[2, 3], None).unwrap();
        assert_eq!(titles(&both), vec!["fourth", "second"]);
    }

    #[test]
    fn hydration_matches_each_post() {
        let b = board();
        let p1 = b.post(b.alice, "one", "x", &[1, 3], 1);
        let p2 = b.post(b.bob, "two", "x", &[2], 2);
        b.reactions.toggle(TargetKind::Post, p1, b.bob, ReactionAction::Like).unwrap();
        b.reactions.toggle(TargetKind::Post, p2, b.alice, ReactionAction::Dislike).unwrap();
        b.reactions.toggle(TargetKind::Post, p2, b.bob, ReactionAction::Dislike).unwrap();

        let posts = b.query.list_posts("", &[], None).unwrap();
        let two = &posts[0];
        let one = &posts[1];

        assert_eq!(two.id, p2);
        assert_eq!(two.author_username, "bob");
        assert_eq!(two.categories.iter().map(|c| c.id).collect::<Vec<_>>(), vec![2]);
        assert_eq!((two.likes, two.dislikes), (0, 2));

        assert_eq!(one.id, p1);
        assert_eq!(one.author_username, "alice");
        assert_eq!(one.categories.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(), vec!["General", "Questions"]);
        assert_eq!((one.likes, one.dislikes), (1, 0));
    }

    #[test]
    fn liked_only_follows_current_state() {
        let b = board();
        let p1 = b.post(b.alice, "one", "x", &[1], 1);
        let p2 = b.post(b.alice, "two", "x", &[1], 2);

        b.reactions.toggle(TargetKind::Post, p1, b.bob, ReactionAction::Like).unwrap();
        b.reactions.toggle(TargetKind::Post, p2, b.bob, ReactionAction::Like).unwrap();
        assert_eq!(titles(&b.query.list_posts("", &[], Some(b.bob)).unwrap()), vec!["two", "one"]);

        // flipping to dislike removes it from the liked view
        b.reactions.toggle(TargetKind::Post, p2, b.bob, ReactionAction::Dislike).unwrap();
        assert_eq!(titles(&b.query.list_posts("", &[], Some(b.bob)).unwrap()), vec!["one"]);

        // someone else's likes do not count
        assert!(b.query.list_posts("", &[], Some(b.alice)).unwrap().is_empty());
    }

    #[test]
    fn post_page_includes_comments_with_counts() {
        let b = board();
        let p = b.post(b.alice, "one", "x", &[1], 1);
        let c1 = b.db.insert_comment(p, b.bob, "first!", at(2)).unwrap();
        b.db.insert_comment(p, b.alice, "thanks", at(3)).unwrap();
        b.reactions.toggle(TargetKind::Comment, c1, b.alice, ReactionAction::Like).unwrap();

        let detail = b.query.get_post(p).unwrap();
        assert_eq!(detail.post.title, "one");
        assert_eq!(detail.comments.len(), 2);
        assert_eq!(detail.comments[0].author_username, "bob");
        assert_eq!((detail.comments[0].likes, detail.comments[0].dislikes), (1, 0));
        assert_eq!(detail.comments[1].content, "thanks");

        assert!(matches!(b.query.get_post(4040), Err(ForumError::NotFound(_))));
    }

    #[test]
    fn categories_are_listed_in_id_order() {
        let b = board();
        let names: Vec<String> = b.query.list_categories().unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["General", "News", "Questions", "Off-topic"]);
    }
}
