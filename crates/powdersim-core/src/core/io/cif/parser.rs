use super::CifError;
use super::document::{CifBlock, CifDocument, CifLoop, normalize_tag};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    DataBlock(String),
    Loop,
    Tag(String),
    Value(String),
}

#[derive(Debug)]
struct Spanned {
    token: Token,
    line: usize,
}

fn syntax(line: usize, message: impl Into<String>) -> CifError {
    CifError::Syntax {
        line,
        message: message.into(),
    }
}

fn tokenize(text: &str) -> Result<Vec<Spanned>, CifError> {
    let mut tokens = Vec::new();
    let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l));

    while let Some((line_no, line)) = lines.next() {
        if let Some(first) = line.strip_prefix(';') {
            let mut field = vec![first.to_string()];
            let mut closed = false;
            for (_, next) in lines.by_ref() {
                if next.starts_with(';') {
                    closed = true;
                    break;
                }
                field.push(next.to_string());
            }
            if !closed {
                return Err(syntax(line_no, "unterminated text field"));
            }
            let value = field.join("\n").trim().to_string();
            tokens.push(Spanned {
                token: Token::Value(value),
                line: line_no,
            });
            continue;
        }
        tokenize_line(line, line_no, &mut tokens)?;
    }
    Ok(tokens)
}

fn tokenize_line(line: &str, line_no: usize, tokens: &mut Vec<Spanned>) -> Result<(), CifError> {
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c == '#' {
            break;
        }
        if c == '\'' || c == '"' {
            let quote = c;
            let start = i + 1;
            let mut end = None;
            let mut j = start;
            while j < chars.len() {
                let closes = chars[j] == quote
                    && chars.get(j + 1).is_none_or(|next| next.is_whitespace());
                if closes {
                    end = Some(j);
                    break;
                }
                j += 1;
            }
            let Some(end) = end else {
                return Err(syntax(line_no, "unterminated quoted string"));
            };
            tokens.push(Spanned {
                token: Token::Value(chars[start..end].iter().collect()),
                line: line_no,
            });
            i = end + 1;
            continue;
        }

        let start = i;
        while i < chars.len() && !chars[i].is_whitespace() {
            i += 1;
        }
        let word: String = chars[start..i].iter().collect();
        tokens.push(Spanned {
            token: classify(word, line_no)?,
            line: line_no,
        });
    }
    Ok(())
}

fn classify(word: String, line_no: usize) -> Result<Token, CifError> {
    let lower = word.to_ascii_lowercase();
    if lower.starts_with("data_") {
        return Ok(Token::DataBlock(word[5..].to_string()));
    }
    if lower == "loop_" {
        return Ok(Token::Loop);
    }
    if lower.starts_with("save_") || lower == "global_" || lower == "stop_" {
        return Err(syntax(line_no, format!("unsupported reserved word '{word}'")));
    }
    if word.starts_with('_') {
        return Ok(Token::Tag(normalize_tag(&word)));
    }
    Ok(Token::Value(word))
}

fn current_block(document: &mut CifDocument, line: usize) -> Result<&mut CifBlock, CifError> {
    document
        .blocks
        .last_mut()
        .ok_or_else(|| syntax(line, "content before the first data block"))
}

pub(super) fn parse_document(text: &str) -> Result<CifDocument, CifError> {
    let tokens = tokenize(text)?;
    let mut document = CifDocument::default();
    let mut iter = tokens.into_iter().peekable();

    while let Some(Spanned { token, line }) = iter.next() {
        match token {
            Token::DataBlock(name) => document.blocks.push(CifBlock::new(name)),
            Token::Tag(tag) => match iter.next() {
                Some(Spanned {
                    token: Token::Value(value),
                    ..
                }) => current_block(&mut document, line)?
                    .items
                    .push((tag, value)),
                _ => return Err(syntax(line, format!("item '{tag}' has no value"))),
            },
            Token::Loop => {
                let mut cif_loop = CifLoop::default();
                while let Some(Spanned {
                    token: Token::Tag(_),
                    ..
                }) = iter.peek()
                {
                    if let Some(Spanned {
                        token: Token::Tag(tag),
                        ..
                    }) = iter.next()
                    {
                        cif_loop.tags.push(tag);
                    }
                }
                if cif_loop.tags.is_empty() {
                    return Err(syntax(line, "loop_ without tags"));
                }

                let mut values = Vec::new();
                while let Some(Spanned {
                    token: Token::Value(_),
                    ..
                }) = iter.peek()
                {
                    if let Some(Spanned {
                        token: Token::Value(value),
                        ..
                    }) = iter.next()
                    {
                        values.push(value);
                    }
                }
                let width = cif_loop.tags.len();
                if values.len() % width != 0 {
                    return Err(syntax(
                        line,
                        format!(
                            "loop has {} values, not a multiple of its {width} tags",
                            values.len()
                        ),
                    ));
                }
                cif_loop.rows = values.chunks(width).map(|row| row.to_vec()).collect();
                current_block(&mut document, line)?.loops.push(cif_loop);
            }
            Token::Value(value) => {
                current_block(&mut document, line)?;
                return Err(syntax(line, format!("value '{value}' without a tag")));
            }
        }
    }

    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
# A comment line
data_si
_cell.length_a   5.4309(1)   # trailing comment
_space_group.name_H-M_alt  'F d -3 m'
_publ_section_title
;
 Silicon
 standard
;
loop_
_atom_site.label
_atom_site.type_symbol
_atom_site.fract_x
_atom_site.fract_y
_atom_site.fract_z
Si1 Si 0.125 0.125 0.125
Si2 "Si" 0 0.5 0.5

data_second
_cell_length_a 3.0
"#;

    #[test]
    fn parses_items_loops_quotes_and_text_fields() {
        let document = CifDocument::parse(SAMPLE).unwrap();
        assert_eq!(document.blocks.len(), 2);

        let block = document.first_block().unwrap();
        assert_eq!(block.name, "si");
        assert_eq!(block.value("_cell_length_a"), Some("5.4309(1)"));
        assert_eq!(block.value("_space_group_name_h-m_alt"), Some("F d -3 m"));
        assert_eq!(block.value("_publ_section_title"), Some("Silicon\n standard"));
        assert_eq!(
            block.column("_atom_site_label"),
            Some(vec!["Si1", "Si2"])
        );
        assert_eq!(block.column("_atom_site.type_symbol"), Some(vec!["Si", "Si"]));

        assert_eq!(
            document.block("SECOND").unwrap().value("_cell.length_a"),
            Some("3.0")
        );
    }

    #[test]
    fn quotes_inside_words_do_not_terminate_strings() {
        let document = CifDocument::parse("data_q\n_name 'O'Neil data'\n").unwrap();
        assert_eq!(
            document.first_block().unwrap().value("_name"),
            Some("O'Neil data")
        );
    }

    #[test]
    fn reports_syntax_errors_with_line_numbers() {
        let err = CifDocument::parse("data_x\nloop_\n_a\n_b\n1 2 3\n").unwrap_err();
        assert!(matches!(err, CifError::Syntax { line: 2, .. }));

        let err = CifDocument::parse("_a 1\n").unwrap_err();
        assert!(matches!(err, CifError::Syntax { line: 1, .. }));

        let err = CifDocument::parse("data_x\n_a\n_b 2\n").unwrap_err();
        assert!(matches!(err, CifError::Syntax { line: 2, .. }));

        let err = CifDocument::parse("data_x\n_a\n;\nnever closed\n").unwrap_err();
        assert!(matches!(err, CifError::Syntax { line: 3, .. }));
    }

    #[test]
    fn empty_document_has_no_blocks() {
        let document = CifDocument::parse("# nothing here\n").unwrap();
        assert!(matches!(
            document.first_block(),
            Err(CifError::NoDataBlock)
        ));
    }
}
