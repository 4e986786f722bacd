use super::{Hashtag, Tweet};

/// The three demo tweets served when the live search is unavailable.
#[must_use]
pub fn fallback_tweets(tag: &Hashtag) -> Vec<Tweet> {
    let tag = tag.as_str();
    vec![
        Tweet {
            id: "1".to_string(),
            text: format!("Live demo of #{tag} search in action!"),
            author_name: "UGC Blog Demo".to_string(),
            author_id: "@ugcblog_demo".to_string(),
            likes: 3124,
            retweets: 987,
        },
        Tweet {
            id: "2".to_string(),
            text: format!("Reading and writing about #{tag} on the blog today."),
            author_name: "Blog Reader".to_string(),
            author_id: "@blog_reader".to_string(),
            likes: 2987,
            retweets: 1102,
        },
        Tweet {
            id: "3".to_string(),
            text: format!("Everyone is talking about #{tag} this week."),
            author_name: "Trend Watcher".to_string(),
            author_id: "@trend_watcher".to_string(),
            likes: 3341,
            retweets: 1209,
        },
    ]
}
