use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};
use sscr::{
    extract::Rule,
    html::{FieldError, FieldExt, select_attr, select_text, selector},
    normalize::parse_scaled,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub title: String,
    pub upvotes: u64,
    /// `datetime` of the post, or `N/A`.
    pub date: String,
}

pub struct Posts {
    post: Selector,
    title: Selector,
    votes: Selector,
    time: Selector,
}

impl Posts {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            post: selector("div.Post")?,
            title: selector("h3")?,
            votes: selector(r#"div[data-test-id="post-vote-count"]"#)?,
            time: selector("time")?,
        })
    }
}

impl Rule for Posts {
    type Block = Post;
    type Record = Post;

    fn container(&self) -> &Selector {
        &self.post
    }

    /// No vote counter means no votes; a counter that is not a number
    /// (`"Vote"` on a fresh post) drops the post.
    fn parse(&mut self, post: ElementRef<'_>) -> Result<Option<Post>, FieldError> {
        let title = select_text(post, &self.title).field("title")?;
        let upvotes = match select_text(post, &self.votes) {
            Some(votes) => parse_scaled(&votes).field("upvotes")?,
            None => 0,
        };
        let date = select_attr(post, &self.time, "datetime").unwrap_or("N/A").to_owned();

        Ok(Some(Post { title, upvotes, date }))
    }

    async fn finish(&self, post: Post) -> Result<Post, FieldError> {
        Ok(post)
    }
}
