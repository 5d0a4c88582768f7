/// Remove the longest run of leading spaces and tabs shared by every
/// non-blank line. Whitespace-only lines come out empty and do not count
/// towards the margin; relative indentation is kept.
pub fn dedent(text: &str) -> String {
    let mut margin: Option<&str> = None;

    for line in text.split('\n') {
        if is_blank(line) {
            continue;
        }
        let indent = &line[..line.len() - line.trim_start_matches([' ', '\t']).len()];
        margin = Some(match margin {
            None => indent,
            Some(current) => common_prefix(current, indent),
        });
    }

    let margin = margin.unwrap_or("").len();
    text.split('\n')
        .map(|line| if is_blank(line) { "" } else { &line[margin..] })
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_blank(line: &str) -> bool {
    line.trim_matches([' ', '\t']).is_empty()
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let len = a
        .bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count();
    &a[..len]
}
