//! Reply formatting for comments addressed to a user.

const ABOUT_THIS_BOT: &str = "Instructions for interacting with me using PR comments are available \
by commenting `/lgtm` or `/lgtm cancel` on a pull request. If you have questions or suggestions \
related to my behavior, please file an issue against the repository that runs this bot.";

/// Reply to `login` with `message`, quoting the comment at `body_url` that triggered it.
#[must_use]
pub fn format_response_raw(body: &str, body_url: &str, login: &str, message: &str) -> String {
    let quoted = body
        .split('\n')
        .map(|line| format!(">{line}"))
        .collect::<Vec<_>>()
        .join("\n");
    let reason = format!("In response to [this]({body_url}):\n\n{quoted}\n");
    format_response(login, message, &reason)
}

/// Reply to `login` with `message` and a collapsed `reason`.
#[must_use]
pub fn format_response(login: &str, message: &str, reason: &str) -> String {
    format!("@{login}: {message}\n\n<details>\n\n{reason}\n\n{ABOUT_THIS_BOT}\n</details>")
}
