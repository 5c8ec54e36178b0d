mod lox_test;
use lox_test::*;

lox_test!(if_runs_then_branch
  "if (true) print \"then\";"
  "then"
);

lox_test!(if_skips_then_branch
  "if (false) print \"then\"; print \"after\";"
  "after"
);

lox_test!(if_else
  "if (1 > 2) print \"then\"; else print \"else\";"
  "else"
);

lox_test!(zero_is_truthy
  "if (0) print \"truthy\";"
  "truthy"
);

lox_test!(nil_is_falsey
  "if (nil) print \"then\"; else print \"else\";"
  "else"
);

lox_test!(while_loop_counts_down
  "var i = 3; while (i > 0) { print i; i = i - 1; }"
  "3"
  "2"
  "1"
);

lox_test!(while_loop_may_not_run
  "while (false) { print \"never\"; } print \"done\";"
  "done"
);

lox_test!(for_loop_with_all_clauses
  "for (var i = 0; i < 3; i = i + 1) print i;"
  "0"
  "1"
  "2"
);

lox_test!(for_loop_without_increment
  "for (var i = 0; i < 2;) { print i; i = i + 1; }"
  "0"
  "1"
);

lox_test!(for_loop_with_existing_variable
  "var i = 10; for (; i > 8; i = i - 1) print i;"
  "10"
  "9"
);

lox_test!(for_loop_accumulates
  "var total = 0; for (var i = 1; i <= 4; i = i + 1) total = total + i; print total;"
  "10"
);

lox_test!(and_returns_first_falsey_or_last_value
  "print 1 and 2; print nil and 2; print false and 2;"
  "2"
  "nil"
  "false"
);

lox_test!(or_returns_first_truthy_or_last_value
  "print 1 or 2; print nil or \"x\"; print false or nil;"
  "1"
  "x"
  "nil"
);

lox_test!(and_short_circuits_side_effects
  "var a = 0; fun bump() { a = a + 1; } false and bump(); print a;"
  "0"
);

lox_test!(or_short_circuits_side_effects
  "var a = 0; fun bump() { a = a + 1; } true or bump(); print a;"
  "0"
);

lox_test!(condition_must_be_closed
  "if (true { print 1; }"
  CompileError "Expect ')' after condition."
);

lox_test!(dangling_else_binds_to_nearest_if
  "if (true) if (false) print \"inner\"; else print \"else\";"
  "else"
);
