/// Delimited-text tokenizer for authored story tables.
///
/// Pure tokenization: no header or type interpretation happens here.

/// Field delimiter.
pub const DELIMITER: char = ',';
/// Quote character; a doubled quote inside a quoted run is a literal quote.
pub const QUOTE: char = '"';

/// A single tokenized row.
pub type Row = Vec<String>;

/// Parse CSV text into rows of fields.
///
/// - `""` inside quotes emits `"`; a lone quote ends quoting.
/// - Outside quotes, `,` ends a field and `\n` ends a row (a preceding
///   `\r` is stripped).
/// - A row made of one empty field is a blank line and is dropped.
/// - Content after the last newline becomes a final row. An unterminated
///   quote at EOF is tolerated and flushes whatever was accumulated.
pub fn parse(input: &str) -> Vec<Row> {
    let mut rows = Vec::new();
    let mut row: Row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == QUOTE {
                if chars.peek() == Some(&QUOTE) {
                    field.push(QUOTE);
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }

        match c {
            QUOTE => in_quotes = true,
            DELIMITER => row.push(std::mem::take(&mut field)),
            '\n' => {
                strip_cr(&mut field);
                row.push(std::mem::take(&mut field));
                let finished = std::mem::take(&mut row);
                if !is_blank(&finished) {
                    rows.push(finished);
                }
            }
            _ => field.push(c),
        }
    }

    if !field.is_empty() || in_quotes || !row.is_empty() {
        strip_cr(&mut field);
        row.push(field);
        rows.push(row);
    }

    rows
}

fn strip_cr(field: &mut String) {
    if field.ends_with('\r') {
        field.pop();
    }
}

fn is_blank(row: &[String]) -> bool {
    row.len() == 1 && row[0].is_empty()
}
