//! Argument handling shared by the `compare_files` and `fdiff` binaries.

use std::ffi::OsString;

/// Single-dash multi-letter aliases of `compare_files`
pub const COMPARE_ALIASES: &[(&str, &str)] = &[
    ("-d1", "--dir1"),
    ("-d2", "--dir2"),
    ("-mp", "--match_path"),
    ("-lim", "--limit"),
    ("-di", "--diff"),
    ("-dbg", "--debug"),
];

/// Single-dash multi-letter aliases of `fdiff`
pub const DIFF_ALIASES: &[(&str, &str)] = &[("-md", "--maxdiff")];

/// Rewrite aliases like `-d1 x` or `-d1=x` to their long form so clap can
/// parse them. Arguments after `--` are left alone.
pub fn expand_aliases<I, T>(args: I, aliases: &[(&str, &str)]) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut expanded = Vec::new();
    let mut passthrough = false;

    for arg in args {
        let arg: OsString = arg.into();
        if passthrough {
            expanded.push(arg);
            continue;
        }

        let rewritten = arg.to_str().and_then(|text| {
            if text == "--" {
                return None;
            }
            let (flag, value) = match text.split_once('=') {
                Some((flag, value)) => (flag, Some(value)),
                None => (text, None),
            };
            aliases
                .iter()
                .find(|(short, _)| *short == flag)
                .map(|(_, long)| match value {
                    Some(value) => format!("{long}={value}"),
                    None => long.to_string(),
                })
        });

        if arg == "--" {
            passthrough = true;
        }
        expanded.push(rewritten.map(OsString::from).unwrap_or(arg));
    }

    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(args: &[&str], aliases: &[(&str, &str)]) -> Vec<String> {
        expand_aliases(args.iter().copied(), aliases)
            .into_iter()
            .map(|a| a.into_string().unwrap())
            .collect()
    }

    #[test]
    fn test_expand_compare_aliases() {
        let args = expand(
            &["compare_files", "-d1", "a", "-d2=b", "-mp", "-lim", "3", "-di", "unified", "-dbg"],
            COMPARE_ALIASES,
        );
        assert_eq!(
            args,
            vec![
                "compare_files",
                "--dir1",
                "a",
                "--dir2=b",
                "--match_path",
                "--limit",
                "3",
                "--diff",
                "unified",
                "--debug"
            ]
        );
    }

    #[test]
    fn test_expand_leaves_other_args() {
        let args = expand(&["fdiff", "-u", "-md", "10", "a.txt", "b.txt"], DIFF_ALIASES);
        assert_eq!(args, vec!["fdiff", "-u", "--maxdiff", "10", "a.txt", "b.txt"]);
    }

    #[test]
    fn test_expand_stops_after_double_dash() {
        let args = expand(&["fdiff", "--", "-md", "x"], DIFF_ALIASES);
        assert_eq!(args, vec!["fdiff", "--", "-md", "x"]);
    }
}
