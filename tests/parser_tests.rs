// tests/parser_tests.rs

use ipl::syntax::parse;
use ipl::{Node, NodeKind, Outcome, Parser};

// Helpers asserting the overall outcome for a batch of sources.

fn assert_all_parse(cases: &[&str]) {
    for src in cases {
        let mut root = Node::root();
        let mut parser = Parser::new(src);
        assert_eq!(
            parser.parse(&mut root),
            Outcome::Ok,
            "should parse: {src}\n(complete mark {}, attempt mark {})",
            parser.complete_mark(),
            parser.high_water(),
        );
    }
}

fn assert_none_parse(cases: &[&str]) {
    for src in cases {
        let mut root = Node::root();
        let mut parser = Parser::new(src);
        assert_eq!(parser.parse(&mut root), Outcome::Fail, "should fail: {src}");
        assert!(
            parser.complete_mark().offset <= parser.high_water().offset,
            "marks out of order for: {src}"
        );
    }
}

// ---
// Literals
// ---

#[test]
fn test_empty_and_comment_only_input() {
    assert_all_parse(&["", "   \t\n", "# this is a comment", "# one\n# two"]);
}

#[test]
fn test_bool_literals() {
    assert_all_parse(&["true;", "false;"]);
}

#[test]
fn test_integer_literals() {
    assert_all_parse(&["0;", "1234;", "0x5;", "0x1;", "0x1a;", "0xe8;"]);
}

#[test]
fn test_float_literals() {
    assert_all_parse(&[
        "123.;", ".234;", "0.3;", "4.0;", "5e6;", "6.e7;", ".7e8;", "8.1e9;", "8.2e-9;",
        "8.3e+9;",
    ]);
}

#[test]
fn test_string_literals() {
    assert_all_parse(&[
        "\"\";",
        "\"foo\";",
        "\"\\\"foo\\\"\";",
        "\"multiple\" \" adjacent\" \" strings\";",
    ]);
}

#[test]
fn test_adjacent_strings_concatenate_into_one_node() {
    let root = parse("test", "\"multiple\" \" adjacent\" \" strings\";").expect("parse");
    let stmt = root.child(0).unwrap().child(0).unwrap();
    assert_eq!(stmt.kind, NodeKind::ExprStmt);
    let lit = stmt.child(0).unwrap();
    assert_eq!(lit.kind, NodeKind::StringLit);
    assert_eq!(lit.text, "multiple adjacent strings");
    assert!(lit.is_leaf());
}

#[test]
fn test_identifiers() {
    assert_all_parse(&["a;", "Avar;", "_avar;", "a_var;", "avar_;", "a1var_1;"]);
    // A number followed by identifier characters is a number and a stray
    // identifier, which no statement accepts.
    assert_none_parse(&["1var;"]);
}

// ---
// Expressions
// ---

#[test]
fn test_operator_expressions() {
    assert_all_parse(&[
        "a = (b % c + d / e) - x * -y;",
        "a = ~x & (y << 1) | (z >> 2) ^ w;",
        "a = !(x < 1) && (x < 10) || (x == 12);",
    ]);
}

#[test]
fn test_precedence_shapes_the_tree() {
    // 1 + 2 * 3 must nest the product under the sum.
    let root = parse("test", "a = 1 + 2 * 3;").expect("parse");
    let stmt = root.child(0).unwrap().child(0).unwrap();
    let assign = stmt.child(0).unwrap();
    assert_eq!(assign.kind, NodeKind::AssignExpr);
    let sum = assign.child(1).unwrap();
    assert_eq!(sum.kind, NodeKind::BinaryExpr);
    assert_eq!(sum.text, "+");
    let product = sum.child(1).unwrap();
    assert_eq!(product.kind, NodeKind::BinaryExpr);
    assert_eq!(product.text, "*");
}

#[test]
fn test_binary_operators_are_left_associative() {
    let root = parse("test", "a = 10 - 4 - 3;").expect("parse");
    let assign = root.child(0).unwrap().child(0).unwrap().child(0).unwrap();
    let outer = assign.child(1).unwrap();
    assert_eq!(outer.text, "-");
    // Left child is itself the (10 - 4) subtraction.
    assert_eq!(outer.child(0).unwrap().text, "-");
    assert_eq!(outer.child(1).unwrap().text, "3");
}

#[test]
fn test_grouping() {
    assert_all_parse(&[
        "a = (1);",
        "a = ((1));",
        "(1);",
        "(\"a literal string\");",
        "(someFunctionOrMethod(a, 1));",
        "(aVariable);",
    ]);
    assert_none_parse(&[
        // parentheses must contain something
        "a = ();",
        // parentheses must match count
        "a = ());",
        "a = (();",
        // cannot assign in a group
        "(a = b + c);",
    ]);
}

#[test]
fn test_compound_assignment_operators() {
    assert_all_parse(&[
        "a += 1;", "a -= 1;", "a *= 2;", "a /= 2;", "a %= 2;", "a &= 3;", "a |= 3;", "a ^= 3;",
        "a <<= 1;", "a >>= 1;",
    ]);
}

#[test]
fn test_member_access_and_calls() {
    assert_all_parse(&[
        "myMethod1();",
        "someInstance.myMethod1();",
        "someInstance.someSubInstance.myMethod1();",
        "f(a, 1,);",
        "obj.field = obj.other.method(1 + 2, \"x\");",
    ]);
}

// ---
// Statements
// ---

#[test]
fn test_loops() {
    assert_all_parse(&[
        "loop {}",
        "loop post {}",
        "loop { break; }",
        "loop { continue; }",
        "loop { return; }",
        "loop (;;) {}",
        "loop (a += 1;;) {}",
        "loop (a += 1, b += 1;;) {}",
        "loop (a = b - 7 * 5, c = d + 1, x = 5;;) {}",
        "loop (int32 a = b, c = d + 1, x = 5;;) {}",
        "loop (SomeClass a = 1, b = 2, c = 3;;) {}",
        "loop (int32 a = 1, b = 2, c = 3; a < 10; a += 1, b += 1, c += 1) {}",
        "loop post (int32 a = 1; a < 10; a += 1) {}",
    ]);
    // Once the parenthesized clause opens, both semicolons are mandatory.
    assert_none_parse(&["loop (a += 1) {}", "loop (;) {}", "loop (;;)"]);
}

#[test]
fn test_loop_tree_records_post_and_clauses() {
    let root = parse("test", "loop post (int32 a = 1; a < 10; a += 1) {}").expect("parse");
    let node = root.child(0).unwrap().child(0).unwrap();
    assert_eq!(node.kind, NodeKind::LoopStmt);
    assert_eq!(node.text, "post");
    let kinds: Vec<_> = node.children().iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![
            NodeKind::LoopInit,
            NodeKind::LoopCond,
            NodeKind::LoopUpdate,
            NodeKind::Block
        ]
    );
}

#[test]
fn test_vector_literals() {
    assert_all_parse(&[
        "vector<sint32> foo1 = [];",
        "vector<sint32> foo2 = [ 5 ];",
        "vector<sint32> foo3 = [5,];",
        "vector<sint32> foo4 = [5,6];",
        "vector<sint32> foo2 = [2+7, asdf ];",
        "vector<vector<sint32>> foo2 = [[1], [2, 3]];",
    ]);
}

#[test]
fn test_map_literals_and_nested_generics() {
    // The parser does no type checking, so it will not fail on a type
    // mismatch in an initializer.
    assert_all_parse(&[
        "map<uint32, customType > bar = 1;",
        "map<uint32, customType > bar = [ \"a\" : 1];",
        "map< uint32, vector < customType>> bar = [];",
        "map< uint32, vector < customType>> bar = [1:1];",
        "map< uint32, vector < customType>> bar = [ 1 : 1, asdf : 5 + 7, ];",
    ]);
}

#[test]
fn test_nested_generic_type_tree() {
    let root = parse("test", "map<uint32, vector<customType>> bar = [];").expect("parse");
    let decl = root.child(0).unwrap().child(0).unwrap();
    let ty = decl.child(0).unwrap();
    assert_eq!(ty.kind, NodeKind::MapType);
    assert_eq!(ty.child(0).unwrap().kind, NodeKind::TypeName);
    assert_eq!(ty.child(0).unwrap().text, "uint32");
    let value_ty = ty.child(1).unwrap();
    assert_eq!(value_ty.kind, NodeKind::VectorType);
    assert_eq!(value_ty.child(0).unwrap().text, "customType");
}

#[test]
fn test_declarations() {
    assert_all_parse(&[
        "int32 a = 1;",
        "int32 a = 1, b = 2, c = a + b;",
        "customType thing = makeThing();",
    ]);
    // Declarators always take an initializer; the statement list does not
    // tolerate a trailing comma.
    assert_none_parse(&["int32 a;", "int32 a = 1,;", "int32 = 1;"]);
}

// ---
// Functions and classes
// ---

#[test]
fn test_functions() {
    assert_all_parse(&[
        "void aVoidFunc() {}",
        // no type checking, so no failure on a missing return statement
        "uint32 aParameterlessFunc() {}",
        "sint32 myfunc(uint32 foo, uint8 bar) {}",
    ]);
    assert_none_parse(&[
        // curly braces required (i.e. no forward declarations allowed)
        "void aVoidFunc()",
        "void aVoidFunc();",
        // access specifiers belong to methods, not free functions
        "public uint32 myFunc1() {}",
    ]);
}

#[test]
fn test_classes() {
    assert_all_parse(&[
        "class SomeClass {}",
        "class SomeChildClass : SomeParentClass {}",
        "class SomeClass { private int x = 1; }",
        "class SomeClass { private int x = 1, y = 2; }",
        "class SomeClass { protected int x = 1; }",
        "class SomeClass { public int x = 1; }",
        "class SomeClass { private void someMethod() {} }",
        "class SomeClass { protected void someMethod() {} }",
        "class SomeClass { public void someMethod() {} }",
        "class SomeClass { public int32 someMethod(int64 a, string b) {} }",
    ]);
    assert_none_parse(&[
        // variable access specifier required
        "class SomeClass { int x = 1; }",
        // method access specifier required
        "class SomeClass { void someMethod() {} }",
        // method return type required
        "class SomeClass { private someMethod() {} }",
    ]);
}

#[test]
fn test_class_tree_structure() {
    let src = "class Square : Shape { private float width = 1.0; public float area() {} }";
    let root = parse("test", src).expect("parse");
    let class = root.child(0).unwrap().child(0).unwrap();
    assert_eq!(class.kind, NodeKind::ClassDecl);
    assert_eq!(class.text, "Square");
    assert_eq!(class.child(0).unwrap().kind, NodeKind::Inherit);
    assert_eq!(class.child(0).unwrap().text, "Shape");
    let var = class.child(1).unwrap();
    assert_eq!(var.kind, NodeKind::MemberVar);
    assert_eq!(var.child(0).unwrap().kind, NodeKind::AccessSpec);
    assert_eq!(var.child(0).unwrap().text, "private");
    let method = class.child(2).unwrap();
    assert_eq!(method.kind, NodeKind::MemberMethod);
    assert_eq!(method.text, "area");
    assert_eq!(method.child(0).unwrap().text, "public");
}

// ---
// Regex literals
// ---

#[test]
fn test_regex_literals() {
    assert_all_parse(&[
        "/1/;",
        "/[ab]/;",
        "/[a-z]/;",
        "/[a-z]*/;",
        "/[a-z]+/;",
        "/[a-z]?/;",
        "/[a-z]+|[0-9]+/;",
        "/[_A-Za-z][0-9_A-Za-z]*/;",
        "/ab+(c|[de])*/;",
        "bool found =~ /[_A-Za-z][0-9_A-Za-z]*/;",
        "vector<string> matches =~ /x(([_A-Za-z])[0-9_A-Za-z]*)y/;",
    ]);
    assert_none_parse(&[
        // empty regex not allowed
        "//;",
        "bool found =~ //;",
        // structurally broken patterns
        "/a(/;",
        "/[]/;",
        "/*a/;",
    ]);
}

#[test]
fn test_slash_is_division_outside_regex_position() {
    let root = parse("test", "a = b / c;").expect("parse");
    let assign = root.child(0).unwrap().child(0).unwrap().child(0).unwrap();
    let div = assign.child(1).unwrap();
    assert_eq!(div.kind, NodeKind::BinaryExpr);
    assert_eq!(div.text, "/");
}

// ---
// Failure positions
// ---

#[test]
fn test_failure_marks_straddle_the_broken_statement() {
    let src = "int32 a = 1;\nint32 b = ;\n";
    let mut root = Node::root();
    let mut parser = Parser::new(src);
    assert_eq!(parser.parse(&mut root), Outcome::Fail);
    // The complete mark sits at the end of the first statement.
    assert_eq!(parser.pos(), 12);
    assert_eq!(parser.line(), 1);
    // The attempt mark got into the second line before giving up.
    assert_eq!(parser.high_water().line, 2);
    assert!(parser.high_water().offset > parser.complete_mark().offset);
    // A failed parse leaves the root unpopulated.
    assert_eq!(root.child_count(), 0);
}

#[test]
fn test_multi_statement_programs() {
    let src = "\
# a small program
int32 total = 0;
loop (int32 i = 0; i < 10; i += 1) {
    total = total + i;
}
void report(int32 value) {
    print(value);
}
";
    let root = parse("test", src).expect("parse");
    let program = root.child(0).unwrap();
    assert_eq!(program.kind, NodeKind::Program);
    assert_eq!(program.child_count(), 3);
}
