use super::ast::{CommandChain, Stage};
use super::lexer::{is_separator, Lexer, Token};
use crate::error::ParseError;

pub const COMPLETION_MARKER: char = '?';
pub const BACKGROUND_MARKER: char = '&';

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current_token: Token,
    background: bool,
    completion: bool,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Result<Self, ParseError> {
        let (body, background, completion) = strip_markers(input);
        let mut lexer = Lexer::new(body);
        let current_token = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current_token,
            background,
            completion,
        })
    }

    fn next_token(&mut self) -> Result<(), ParseError> {
        self.current_token = self.lexer.next_token()?;
        Ok(())
    }

    pub fn parse_chain(&mut self) -> Result<CommandChain, ParseError> {
        let mut stages = Vec::new();

        loop {
            let stage = self.parse_stage()?;
            match self.current_token {
                Token::Pipe => {
                    if stage.name.is_empty() {
                        return Err(ParseError::EmptyStage);
                    }
                    stages.push(stage);
                    self.next_token()?;
                }
                _ => {
                    // a lone redirect is still missing its command
                    if stage.name.is_empty() && (!stages.is_empty() || !stage.redirects.is_empty()) {
                        return Err(ParseError::EmptyStage);
                    }
                    stages.push(stage);
                    break;
                }
            }
        }

        Ok(CommandChain::new(stages, self.background, self.completion))
    }

    fn parse_stage(&mut self) -> Result<Stage, ParseError> {
        let mut stage = Stage::default();

        loop {
            match &self.current_token {
                Token::EOF | Token::Pipe => break,
                // already taken from the trailing marker
                Token::Background => {}
                Token::Redirect(op, target) => {
                    stage.redirects.set(*op, target.clone());
                }
                Token::Word(word) => {
                    if stage.name.is_empty() {
                        stage.name = word.clone();
                    } else {
                        stage.arguments.push(word.clone());
                    }
                }
            }
            self.next_token()?;
        }

        Ok(stage)
    }
}

/// Trims the line and removes at most one trailing completion marker and one
/// trailing background marker, in either order.
fn strip_markers(line: &str) -> (&str, bool, bool) {
    let mut body = line.trim_matches(is_separator);
    let mut background = false;
    let mut completion = false;

    loop {
        if !completion {
            if let Some(rest) = body.strip_suffix(COMPLETION_MARKER) {
                completion = true;
                body = rest.trim_end_matches(is_separator);
                continue;
            }
        }
        if !background {
            if let Some(rest) = body.strip_suffix(BACKGROUND_MARKER) {
                background = true;
                body = rest.trim_end_matches(is_separator);
                continue;
            }
        }
        break;
    }

    (body, background, completion)
}

/// Turns one input line into a command chain.
pub fn parse(line: &str) -> Result<CommandChain, ParseError> {
    Parser::new(line)?.parse_chain()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_simple_command() {
        let chain = parse("ls -l").unwrap();
        assert_eq!(chain.len(), 1);
        let cmd = chain.first();
        assert_eq!(cmd.name, "ls");
        assert_eq!(cmd.arguments, vec!["-l"]);
        assert!(cmd.redirects.is_empty());
        assert!(!chain.background);
        assert!(!chain.completion);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_quoted_argument_and_truncate_redirect() {
        let chain = parse("cmd 'hello world' >out.txt").unwrap();
        let cmd = chain.first();
        assert_eq!(cmd.name, "cmd");
        assert_eq!(cmd.arguments, vec!["hello world"]);
        assert_eq!(cmd.redirects.truncate(), Some("out.txt"));
        assert_eq!(cmd.redirects.append(), None);
        assert_eq!(cmd.redirects.input(), None);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_whitespace_trimming_is_idempotent() {
        assert_eq!(parse("  ls  ").unwrap(), parse("ls").unwrap());
        assert_eq!(parse("\tls -a \t").unwrap(), parse("ls -a").unwrap());
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_pipeline() {
        let chain = parse("a | b x | c").unwrap();
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.first().name, "a");
        assert_eq!(chain.successor(0).unwrap().name, "b");
        assert_eq!(chain.successor(0).unwrap().arguments, vec!["x"]);
        assert_eq!(chain.successor(1).unwrap().name, "c");
        assert!(chain.successor(2).is_none());
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_background() {
        let chain = parse("sleep 5 &").unwrap();
        assert_eq!(chain.first().name, "sleep");
        assert_eq!(chain.first().arguments, vec!["5"]);
        assert!(chain.background);

        let glued = parse("sleep 5&").unwrap();
        assert_eq!(glued, chain);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_mid_stream_ampersand_is_ignored() {
        let chain = parse("echo a & b").unwrap();
        assert_eq!(chain.first().arguments, vec!["a", "b"]);
        assert!(!chain.background);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_completion_marker() {
        let chain = parse("lis?").unwrap();
        assert!(chain.completion);
        assert_eq!(chain.first().name, "lis");

        let both = parse("foo bar &?").unwrap();
        assert!(both.completion);
        assert!(both.background);
        assert_eq!(both.first().arguments, vec!["bar"]);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_last_output_redirect_wins() {
        let chain = parse("echo hi >a.txt >>b.txt").unwrap();
        assert_eq!(chain.first().redirects.append(), Some("b.txt"));
        assert_eq!(chain.first().redirects.truncate(), None);

        let chain = parse("echo hi >>b.txt >a.txt").unwrap();
        assert_eq!(chain.first().redirects.truncate(), Some("a.txt"));
        assert_eq!(chain.first().redirects.append(), None);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_empty_line_is_noop() {
        let chain = parse("   \t ").unwrap();
        assert!(chain.is_noop());
        assert!(chain.first().arguments.is_empty());
    }

    #[test]
    fn test_malformed_input() {
        assert_eq!(parse("ls |"), Err(ParseError::EmptyStage));
        assert_eq!(parse("| wc"), Err(ParseError::EmptyStage));
        assert_eq!(parse(">out.txt"), Err(ParseError::EmptyStage));
        assert_eq!(
            parse("cat <"),
            Err(ParseError::MissingRedirectTarget("<".to_string()))
        );
        assert_eq!(
            parse("echo \"half"),
            Err(ParseError::UnmatchedQuote("\"half".to_string()))
        );
    }
}
