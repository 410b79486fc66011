//! Two-stack operator precedence parser for query text
//!
//! Operands (finished sub-trees) and pending operators live on separate
//! stacks. Every `(` and `[` pushes a frame marker onto the operator stack,
//! so reductions never cross into the enclosing sub-expression; closing the
//! frame reduces everything above the marker and drops it.
//!
//! Every later pass over the tree recurses, so the depth of the finished
//! tree is capped at [`MAX_DEPTH`].

use super::ast::Node;
use super::error::ParseError;
use super::lexer::{Span, split_tokens};
use crate::tags::SEPARATORS;

/// Deepest syntax tree a query may produce
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Top,
    Paren,
    Bracket,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Open(Frame),
    And,
    Or,
    Not,
}

impl Operator {
    /// Frame markers rank below every real operator and are never reduced
    const fn precedence(self) -> Option<u8> {
        match self {
            Self::Open(_) => None,
            Self::Or => Some(0),
            Self::And => Some(1),
            Self::Not => Some(2),
        }
    }
}

struct Parser<'a> {
    input: &'a str,
    /// Finished sub-trees with their depth
    operands: Vec<(Node, usize)>,
    operators: Vec<(Operator, usize)>,
}

/// Parse query text into a syntax tree
///
/// Returns `Ok(None)` for blank input.
///
/// # Errors
/// Returns `ParseError` when an operand is missing, an operator appears where
/// a tag was expected, brackets are unbalanced, or tokens trail a complete
/// expression, or when the tree would be nested deeper than [`MAX_DEPTH`]
pub fn parse(input: &str) -> Result<Option<Node>, ParseError> {
    let tokens = split_tokens(input, &SEPARATORS);
    if tokens.is_empty() {
        return Ok(None);
    }

    let mut parser = Parser {
        input,
        operands: Vec::new(),
        operators: vec![(Operator::Open(Frame::Top), 0)],
    };
    let mut expect_operand = true;

    for token in tokens {
        expect_operand = if expect_operand {
            parser.operand_token(token)?
        } else {
            parser.operator_token(token)?
        };
    }

    if expect_operand {
        return Err(ParseError::new(input.len(), "Expected a tag at end of query"));
    }
    parser.finish().map(Some)
}

impl Parser<'_> {
    /// Handle a token where an operand is required; returns whether another
    /// operand is still expected
    fn operand_token(&mut self, token: Span<'_>) -> Result<bool, ParseError> {
        match token.text {
            "!" => self.operators.push((Operator::Not, token.offset)),
            "(" => self.operators.push((Operator::Open(Frame::Paren), token.offset)),
            "[" => self.operators.push((Operator::Open(Frame::Bracket), token.offset)),
            "," | "|" | ")" | "]" => {
                return Err(ParseError::new(
                    token.offset,
                    format!("Expected a tag, found '{}'", token.text),
                ));
            }
            value => {
                self.operands.push((Node::leaf(value), 1));
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Handle a token following a complete operand
    fn operator_token(&mut self, token: Span<'_>) -> Result<bool, ParseError> {
        match token.text {
            "," => self.push_binary(Operator::And, token.offset)?,
            "|" => self.push_binary(Operator::Or, token.offset)?,
            ")" => {
                self.close(Frame::Paren, token.offset)?;
                return Ok(false);
            }
            "]" => {
                self.close(Frame::Bracket, token.offset)?;
                return Ok(false);
            }
            other => {
                return Err(ParseError::new(
                    token.offset,
                    format!("Expected ',' or '|' before '{other}'"),
                ));
            }
        }
        Ok(true)
    }

    /// Reduce pending operators that bind strictly tighter, then push `op`
    ///
    /// Equal strengths are left on the stack, which makes `,` and `|`
    /// right-associative.
    fn push_binary(&mut self, op: Operator, offset: usize) -> Result<(), ParseError> {
        while let Some(&(top, top_offset)) = self.operators.last() {
            if top.precedence() <= op.precedence() {
                break;
            }
            self.operators.pop();
            self.reduce(top, top_offset)?;
        }
        self.operators.push((op, offset));
        Ok(())
    }

    /// Reduce down to the nearest frame marker and pop it
    fn close_frame(&mut self) -> Result<(Frame, usize), ParseError> {
        loop {
            match self.operators.pop() {
                Some((Operator::Open(frame), offset)) => return Ok((frame, offset)),
                Some((op, offset)) => self.reduce(op, offset)?,
                None => return Err(ParseError::new(self.input.len(), "Unbalanced query")),
            }
        }
    }

    fn close(&mut self, expected: Frame, offset: usize) -> Result<(), ParseError> {
        let (frame, open_offset) = self.close_frame()?;
        if frame == expected {
            if frame == Frame::Bracket {
                let (inner, depth) = self.pop_operand(open_offset)?;
                self.push_node(Node::group(inner), depth + 1, open_offset)?;
            }
            return Ok(());
        }

        let text = if expected == Frame::Paren { ')' } else { ']' };
        let message = match frame {
            Frame::Top => format!("Unexpected '{text}'"),
            Frame::Paren => "Expected ')'".to_string(),
            Frame::Bracket => "Expected ']'".to_string(),
        };
        Err(ParseError::new(offset, message))
    }

    fn finish(mut self) -> Result<Node, ParseError> {
        let (frame, _) = self.close_frame()?;
        match frame {
            Frame::Top => {}
            Frame::Paren => return Err(ParseError::new(self.input.len(), "Expected ')'")),
            Frame::Bracket => return Err(ParseError::new(self.input.len(), "Expected ']'")),
        }

        let (root, _) = self.pop_operand(self.input.len())?;
        if self.operands.is_empty() {
            Ok(root)
        } else {
            Err(ParseError::new(self.input.len(), "Unexpected trailing tokens"))
        }
    }

    fn reduce(&mut self, op: Operator, offset: usize) -> Result<(), ParseError> {
        let (node, depth) = match op {
            Operator::Not => {
                let (inner, depth) = self.pop_operand(offset)?;
                (Node::not(inner), depth)
            }
            Operator::And | Operator::Or => {
                let (right, right_depth) = self.pop_operand(offset)?;
                let (left, left_depth) = self.pop_operand(offset)?;
                let node = if op == Operator::And {
                    Node::and(left, right)
                } else {
                    Node::or(left, right)
                };
                (node, left_depth.max(right_depth))
            }
            Operator::Open(_) => return Ok(()),
        };
        self.push_node(node, depth + 1, offset)
    }

    fn push_node(&mut self, node: Node, depth: usize, offset: usize) -> Result<(), ParseError> {
        if depth > MAX_DEPTH {
            return Err(ParseError::new(offset, "Query nested too deeply"));
        }
        self.operands.push((node, depth));
        Ok(())
    }

    fn pop_operand(&mut self, offset: usize) -> Result<(Node, usize), ParseError> {
        self.operands
            .pop()
            .ok_or_else(|| ParseError::new(offset, "Missing operand"))
    }
}
