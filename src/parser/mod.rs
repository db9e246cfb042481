//! Recursive-descent parser (C3 grammar half + C4 AST-builder, collapsed
//! into a single pass): walks a token stream and materializes typed AST
//! nodes directly, rather than an intermediate untyped parse tree handed to
//! a second transformer pass.
//!
//! Grammar:
//! ```text
//! program     := import* declaration* agent?
//! import      := 'import' path ('as' IDENT)?
//! path        := (IDENT (('/' | '.') IDENT)*) | ('.' | '..') (('/' | '.') IDENT)+
//! declaration := enumDef | typeDef
//! enumDef     := 'enum' IDENT '{' (IDENT (',' IDENT)* ','?)? '}'
//! typeDef     := 'type' IDENT ('{' field* '}')?
//! field       := IDENT '?'? ':' typeExpr
//! typeExpr    := union
//! union       := postfix ('|' postfix)*
//! postfix     := primary suffix*
//! suffix      := '[' ']' | '?' | '(' range ')'
//! range       := (NUM? '..' NUM?) | NUM '..'
//! primary     := PRIM | IDENT | '(' typeExpr ')'
//! agentDef    := 'agent' IDENT '{' field* '}'
//! ```
//! `workflowDef`/`policyDef` are not part of this textual grammar; see
//! `ast::workflow`'s module doc.

use crate::ast::{
    AgentDef, Declaration, EnumDef, FieldDef, ImportStmt, Primitive, Program, TypeBody, TypeDef,
    TypeExpr,
};
use crate::error::{Code, Diagnostic};
use crate::lexer::{Token, TokenKind};
use crate::location::SourceLocation;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse(source: &str) -> Result<Program, Diagnostic> {
        let tokens = crate::lexer::tokenize(source)?;
        Parser::new(tokens).parse_program()
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn location(&self) -> SourceLocation {
        self.peek().location.clone()
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn at(&self, kind: &TokenKind) -> bool {
        self.kind() == kind
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, Diagnostic> {
        if self.kind() == &kind {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&format!("expected {}", kind)))
        }
    }

    fn expect_identifier(&mut self) -> Result<(String, SourceLocation), Diagnostic> {
        match self.kind().clone() {
            TokenKind::Identifier(name) => {
                let loc = self.location();
                self.advance();
                Ok((name, loc))
            }
            _ => Err(self.unexpected("expected identifier")),
        }
    }

    fn unexpected(&self, context: &str) -> Diagnostic {
        Diagnostic::new(
            Code::UnexpectedToken,
            format!("{}, found {}", context, self.kind()),
            self.location(),
        )
    }

    pub fn parse_program(&mut self) -> Result<Program, Diagnostic> {
        let start = self.location();
        let mut imports = Vec::new();
        while self.at(&TokenKind::Import) {
            imports.push(self.parse_import()?);
        }
        let mut declarations = Vec::new();
        loop {
            match self.kind() {
                TokenKind::Enum => declarations.push(Declaration::Enum(self.parse_enum()?)),
                TokenKind::Type => declarations.push(Declaration::Type(self.parse_type()?)),
                _ => break,
            }
        }
        let agent = if self.at(&TokenKind::Agent) {
            Some(self.parse_agent()?)
        } else {
            None
        };
        if !self.at(&TokenKind::Eof) {
            return Err(self.unexpected("expected end of input"));
        }
        let end = self.location();
        Ok(Program {
            imports,
            declarations,
            agent,
            location: start.merge(&end),
        })
    }

    fn parse_import(&mut self) -> Result<ImportStmt, Diagnostic> {
        let start = self.location();
        self.expect(TokenKind::Import)?;
        let path = self.parse_path()?;
        let alias = if self.at(&TokenKind::As) {
            self.advance();
            Some(self.expect_identifier()?.0)
        } else {
            None
        };
        let end = self.location();
        Ok(ImportStmt {
            path,
            alias,
            location: start.merge(&end),
        })
    }

    /// `path := (IDENT (('/' | '.') IDENT)*) | ('.' | '..') (('/' | '.') IDENT)+`
    fn parse_path(&mut self) -> Result<String, Diagnostic> {
        let mut out = String::new();
        match self.kind().clone() {
            TokenKind::Identifier(name) => {
                out.push_str(&name);
                self.advance();
            }
            TokenKind::Dot => {
                out.push('.');
                self.advance();
            }
            TokenKind::DotDot => {
                out.push_str("..");
                self.advance();
            }
            _ => return Err(self.unexpected("expected import path")),
        }
        loop {
            match self.kind() {
                TokenKind::Slash => {
                    out.push('/');
                    self.advance();
                }
                TokenKind::Dot => {
                    out.push('.');
                    self.advance();
                }
                _ => break,
            }
            let (segment, _) = self.expect_identifier()?;
            out.push_str(&segment);
        }
        Ok(out)
    }

    fn parse_enum(&mut self) -> Result<EnumDef, Diagnostic> {
        let start = self.location();
        self.expect(TokenKind::Enum)?;
        let (name, _) = self.expect_identifier()?;
        self.expect(TokenKind::LBrace)?;
        let mut values = Vec::new();
        if !self.at(&TokenKind::RBrace) {
            loop {
                let (value, loc) = self.expect_identifier()?;
                values.push((value, loc));
                if self.at(&TokenKind::Comma) {
                    self.advance();
                    if self.at(&TokenKind::RBrace) {
                        break;
                    }
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RBrace)?;
        let end = self.location();
        Ok(EnumDef {
            name,
            values,
            location: start.merge(&end),
        })
    }

    fn parse_type(&mut self) -> Result<TypeDef, Diagnostic> {
        let start = self.location();
        self.expect(TokenKind::Type)?;
        let (name, _) = self.expect_identifier()?;
        let body = if self.at(&TokenKind::LBrace) {
            Some(self.parse_type_body()?)
        } else {
            None
        };
        let end = self.location();
        Ok(TypeDef {
            name,
            body,
            location: start.merge(&end),
        })
    }

    fn parse_agent(&mut self) -> Result<AgentDef, Diagnostic> {
        let start = self.location();
        self.expect(TokenKind::Agent)?;
        let (name, _) = self.expect_identifier()?;
        let body = self.parse_type_body()?;
        let end = self.location();
        Ok(AgentDef {
            name,
            fields: body.fields,
            location: start.merge(&end),
        })
    }

    fn parse_type_body(&mut self) -> Result<TypeBody, Diagnostic> {
        let start = self.location();
        self.expect(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        while !self.at(&TokenKind::RBrace) {
            fields.push(self.parse_field()?);
        }
        self.expect(TokenKind::RBrace)?;
        let end = self.location();
        Ok(TypeBody {
            fields,
            location: start.merge(&end),
        })
    }

    fn parse_field(&mut self) -> Result<FieldDef, Diagnostic> {
        let start = self.location();
        let (name, _) = self.expect_identifier()?;
        let optional = if self.at(&TokenKind::Question) {
            self.advance();
            true
        } else {
            false
        };
        self.expect(TokenKind::Colon)?;
        let type_expr = self.parse_type_expr()?;
        let end = type_expr.location().clone();
        Ok(FieldDef {
            name,
            type_expr,
            optional,
            location: start.merge(&end),
        })
    }

    fn parse_type_expr(&mut self) -> Result<TypeExpr, Diagnostic> {
        self.parse_union()
    }

    /// `union := postfix ('|' postfix)*`; a single element collapses to
    /// itself rather than a one-element `Union`.
    fn parse_union(&mut self) -> Result<TypeExpr, Diagnostic> {
        let start = self.location();
        let mut variants = vec![self.parse_postfix()?];
        while self.at(&TokenKind::Pipe) {
            self.advance();
            variants.push(self.parse_postfix()?);
        }
        if variants.len() == 1 {
            Ok(variants.pop().unwrap())
        } else {
            let end = variants.last().unwrap().location().clone();
            Ok(TypeExpr::Union {
                variants,
                location: start.merge(&end),
            })
        }
    }

    /// `postfix := primary suffix*`; suffixes wrap the running type in the
    /// order they're written, so `T[]?` reads as "optional of array-of-T".
    fn parse_postfix(&mut self) -> Result<TypeExpr, Diagnostic> {
        let start = self.location();
        let mut expr = self.parse_primary()?;
        loop {
            match self.kind() {
                TokenKind::LBracket => {
                    self.advance();
                    self.expect(TokenKind::RBracket)?;
                    let end = self.location();
                    expr = TypeExpr::Array {
                        element: Box::new(expr),
                        location: start.merge(&end),
                    };
                }
                TokenKind::Question => {
                    self.advance();
                    let end = self.location();
                    expr = TypeExpr::Optional {
                        inner: Box::new(expr),
                        location: start.merge(&end),
                    };
                }
                TokenKind::LParen => {
                    self.advance();
                    let (min, max) = self.parse_range()?;
                    self.expect(TokenKind::RParen)?;
                    let end = self.location();
                    expr = TypeExpr::Constrained {
                        base: Box::new(expr),
                        min,
                        max,
                        format: None,
                        pattern: None,
                        location: start.merge(&end),
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// `range := (NUM? '..' NUM?) | NUM '..'` — both alternatives collapse
    /// to "optional NUM, `..`, optional NUM"; `..` alone sets neither bound
    /// but the caller still wraps the result in a `Constrained` node.
    fn parse_range(&mut self) -> Result<(Option<i64>, Option<i64>), Diagnostic> {
        let min = if let TokenKind::Number(n) = self.kind() {
            let n = *n as i64;
            self.advance();
            Some(n)
        } else {
            None
        };
        self.expect(TokenKind::DotDot)?;
        let max = if let TokenKind::Number(n) = self.kind() {
            let n = *n as i64;
            self.advance();
            Some(n)
        } else {
            None
        };
        Ok((min, max))
    }

    fn parse_primary(&mut self) -> Result<TypeExpr, Diagnostic> {
        let loc = self.location();
        let prim = |kind: Primitive, loc: SourceLocation| TypeExpr::Primitive {
            kind,
            location: loc,
        };
        match self.kind().clone() {
            TokenKind::PrimString => {
                self.advance();
                Ok(prim(Primitive::String, loc))
            }
            TokenKind::PrimInteger => {
                self.advance();
                Ok(prim(Primitive::Integer, loc))
            }
            TokenKind::PrimNumber => {
                self.advance();
                Ok(prim(Primitive::Number, loc))
            }
            TokenKind::PrimBoolean => {
                self.advance();
                Ok(prim(Primitive::Boolean, loc))
            }
            TokenKind::PrimObject => {
                self.advance();
                Ok(prim(Primitive::Object, loc))
            }
            TokenKind::PrimArray => {
                self.advance();
                Ok(prim(Primitive::Array, loc))
            }
            TokenKind::PrimAny => {
                self.advance();
                Ok(prim(Primitive::Any, loc))
            }
            TokenKind::PrimNull => {
                self.advance();
                Ok(prim(Primitive::Null, loc))
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(TypeExpr::Reference {
                    name,
                    location: loc,
                })
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_type_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            _ => Err(self.unexpected("expected a type")),
        }
    }
}

/// Parses a complete ADL unit. The sole public entry point for C3+C4.
pub fn parse(source: &str) -> Result<Program, Diagnostic> {
    Parser::parse(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_agent_scenario() {
        let program = parse("agent MinimalAgent { name: string  description: string }").unwrap();
        let agent = program.agent.unwrap();
        assert_eq!(agent.name, "MinimalAgent");
        assert_eq!(agent.fields.len(), 2);
        assert_eq!(agent.fields[0].name, "name");
        assert!(!agent.fields[0].optional);
    }

    #[test]
    fn enum_and_reference_scenario() {
        let program =
            parse("enum Status { active inactive } agent A { status: Status }").unwrap();
        assert_eq!(program.enums().count(), 1);
        let agent = program.agent.unwrap();
        match &agent.fields[0].type_expr {
            TypeExpr::Reference { name, .. } => assert_eq!(name, "Status"),
            other => panic!("expected reference, got {:?}", other),
        }
    }

    #[test]
    fn constrained_range_scenario() {
        let program = parse("agent A { age: integer (0..120) }").unwrap();
        let agent = program.agent.unwrap();
        match &agent.fields[0].type_expr {
            TypeExpr::Constrained { min, max, .. } => {
                assert_eq!(*min, Some(0));
                assert_eq!(*max, Some(120));
            }
            other => panic!("expected constrained, got {:?}", other),
        }
    }

    #[test]
    fn array_then_optional_suffix_order() {
        let program = parse("type T { xs: string[]? }").unwrap();
        let body = program.types().next().unwrap().body.as_ref().unwrap();
        match &body.fields[0].type_expr {
            TypeExpr::Optional { inner, .. } => {
                assert!(matches!(**inner, TypeExpr::Array { .. }));
            }
            other => panic!("expected optional-of-array, got {:?}", other),
        }
    }

    #[test]
    fn single_element_union_collapses() {
        let program = parse("type T { x: string | string }").unwrap();
        // Two identical postfixes still form a Union (no dedup); a *single*
        // postfix must never wrap in Union at all.
        let program2 = parse("type T { x: (string) }").unwrap();
        let body2 = program2.types().next().unwrap().body.as_ref().unwrap();
        assert!(matches!(
            body2.fields[0].type_expr,
            TypeExpr::Primitive {
                kind: Primitive::String,
                ..
            }
        ));
        let body = program.types().next().unwrap().body.as_ref().unwrap();
        assert!(matches!(body.fields[0].type_expr, TypeExpr::Union { .. }));
    }

    #[test]
    fn relative_import_path() {
        let program = parse("import ../shared/types as shared\nagent A { x: string }").unwrap();
        assert_eq!(program.imports[0].path, "../shared/types");
        assert_eq!(program.imports[0].alias.as_deref(), Some("shared"));
    }

    #[test]
    fn syntax_error_has_location_and_single_diagnostic() {
        let err = parse("agent A { name string }").unwrap_err();
        assert_eq!(err.code, Code::UnexpectedToken);
    }
}
