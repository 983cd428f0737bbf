//! The reply posted under every voted contribution.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::json;

/// Votes at or below this get the suggestions section.
pub const SUGGESTIONS_MAX_VOTE: f64 = 7.0;
const MAX_PERMLINK_LEN: usize = 255;

const SUGGESTIONS: &str = "#### Suggestions\n\
- Contribute more often to get higher and higher rewards. I wish to see you often!\n\
- Work on your followers to increase the votes/rewards. I follow what humans do and my vote is mainly based on that. Good luck!\n\
#### Get Noticed!\n\
- Did you know project owners can manually vote with their own voting power or by voting power delegated to their projects? Ask the project owner to review your contributions!\n";

const FOOTER: &str = "#### Community-Driven Witness!\n\
I am the first and only Steem Community-Driven Witness. <a href=\"https://discord.gg/zTrEMqB\">Participate on Discord</a>. Lets GROW TOGETHER!\n\
- <a href=\"https://v2.steemconnect.com/sign/account-witness-vote?witness=utopian-io&approve=1\">Vote for my Witness With SteemConnect</a>\n\
- <a href=\"https://v2.steemconnect.com/sign/account-witness-proxy?proxy=utopian-io&approve=1\">Proxy vote to Utopian Witness with SteemConnect</a>\n\
- Or vote/proxy on <a href=\"https://steemit.com/~witnesses\">Steemit Witnesses</a>\n\
\n[![mooncryption-utopian-witness-gif](https://steemitimages.com/DQmYPUuQRptAqNBCQRwQjKWAqWU3zJkL3RXVUtEKVury8up/mooncryption-s-utopian-io-witness-gif.gif)](https://steemit.com/~witnesses)\n\
\n**Up-vote this comment to grow my power and help Open Source contributions like this one. Want to chat? Join me on Discord https://discord.gg/Pc8HG9x**";

/// Markdown body for the reply. `clamped_vote` is the per-category vote before
/// batch rescale.
pub fn render_comment_body(
    author: &str,
    agent: &str,
    achievements: &[String],
    clamped_vote: f64,
) -> String {
    let mut body = format!("### Hey @{author} I am @{agent}. I have just upvoted you!\n");

    if !achievements.is_empty() {
        body.push_str("#### Achievements\n");
        for achievement in achievements {
            body.push_str(&format!("- {achievement}\n"));
        }
    }

    if clamped_vote <= SUGGESTIONS_MAX_VOTE {
        body.push_str(SUGGESTIONS);
    }

    body.push_str(FOOTER);
    body
}

pub fn comment_metadata() -> serde_json::Value {
    json!({
        "tags": ["utopian-io"],
        "community": "utopian",
        "app": "utopian/1.0.0",
    })
}

static TIMESTAMP_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\d{8}t\d{9}z").expect("valid regex"));
static DISALLOWED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9-]+").expect("valid regex"));

/// `re-{author}-{parent permlink}-{timestamp}`, where any timestamp suffix
/// left by an earlier reply is stripped from the parent permlink first.
pub fn comment_permlink(parent_author: &str, parent_permlink: &str, now: DateTime<Utc>) -> String {
    let time = now
        .format("%Y%m%dT%H%M%S%3fZ")
        .to_string()
        .replace(|c: char| !c.is_ascii_alphanumeric(), "");
    let parent = TIMESTAMP_SUFFIX_RE.replace_all(parent_permlink, "");
    let permlink = format!("re-{parent_author}-{parent}-{time}");

    let tail = match permlink.char_indices().rev().nth(MAX_PERMLINK_LEN - 1) {
        Some((start, _)) => &permlink[start..],
        None => permlink.as_str(),
    };
    DISALLOWED_RE
        .replace_all(&tail.to_lowercase(), "")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2018, 3, 4, 5, 6, 7).unwrap() + chrono::Duration::milliseconds(89)
    }

    #[test]
    fn low_vote_gets_suggestions() {
        let body = render_comment_body("alice", "curator", &[], 7.0);
        assert!(body.starts_with("### Hey @alice I am @curator. I have just upvoted you!\n"));
        assert!(body.contains("#### Suggestions"));
        assert!(body.contains("#### Get Noticed!"));
        assert!(!body.contains("#### Achievements"));
        assert!(body.ends_with("https://discord.gg/Pc8HG9x**"));
    }

    #[test]
    fn high_vote_lists_achievements_without_suggestions() {
        let achievements = vec!["First!".to_string(), "Second".to_string()];
        let body = render_comment_body("alice", "curator", &achievements, 7.5);
        assert!(body.contains("#### Achievements\n- First!\n- Second\n"));
        assert!(!body.contains("#### Suggestions"));
    }

    #[test]
    fn metadata_shape() {
        let m = comment_metadata();
        assert_eq!(m["tags"][0], "utopian-io");
        assert_eq!(m["community"], "utopian");
        assert_eq!(m["app"], "utopian/1.0.0");
    }

    #[test]
    fn permlink_has_reply_prefix_and_compact_timestamp() {
        let p = comment_permlink("Alice", "my-post", at());
        assert_eq!(p, "re-alice-my-post-20180304t050607089z");
    }

    #[test]
    fn permlink_strips_previous_reply_timestamp() {
        let p = comment_permlink("bob", "re-alice-my-post-20180101t010203004z", at());
        assert_eq!(p, "re-bob-re-alice-my-post-20180304t050607089z");
    }

    #[test]
    fn permlink_drops_disallowed_chars_and_keeps_tail() {
        let p = comment_permlink("bob", "héllo_world.post", at());
        assert_eq!(p, "re-bob-hlloworldpost-20180304t050607089z");

        let long = "a".repeat(400);
        let p = comment_permlink("bob", &long, at());
        assert_eq!(p.len(), MAX_PERMLINK_LEN);
        assert!(p.ends_with("-20180304t050607089z"));
    }
}
