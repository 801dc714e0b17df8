pub mod recording;
pub mod session;
pub mod ssh;

pub use recording::{RecordedOp, RecordingSession};
pub use session::*;
pub use ssh::{SshOptions, SshSession};

use std::borrow::Cow;

/// Quotes one argument for the remote shell. Plain paths and names pass
/// through unchanged.
pub fn quote(arg: &str) -> Cow<'_, str> {
    shell_words::quote(arg)
}

/// Builds a command line from a program and its arguments, quoting each.
pub fn command_line<I, S>(words: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    shell_words::join(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_plain_arguments_are_untouched() {
        assert_eq!(quote("/data/app/bin"), "/data/app/bin");
        assert_eq!(
            command_line(["mkdir", "-p", "/data/app/bin"]),
            "mkdir -p /data/app/bin"
        );
    }

    #[test]
    fn test_special_characters_are_quoted() {
        assert_eq!(quote("my dir"), "'my dir'");
        assert_eq!(quote("a;rm -rf /"), "'a;rm -rf /'");
    }

    proptest! {
        #[test]
        fn prop_quoted_words_split_back(words in proptest::collection::vec("[ -~]*", 1..5)) {
            let line = command_line(&words);
            let split = shell_words::split(&line).unwrap();
            prop_assert_eq!(split, words);
        }
    }
}
