mod lox_test;
use lox_test::*;

lox_test!(classes_print_their_name
  "class Widget {} print Widget;"
  "<class 'Widget'>"
);

lox_test!(instances_print_their_class
  "class Widget {} print Widget();"
  "<'Widget' object>"
);

lox_test!(fields_are_set_and_read
  "class Box {} var box = Box(); box.value = 3; print box.value;"
  "3"
);

lox_test!(field_assignment_is_an_expression
  "class Box {} var box = Box(); print box.value = 7;"
  "7"
);

lox_test!(methods_are_called_on_instances
  "class Greeter { greet() { print \"hello\"; } } Greeter().greet();"
  "hello"
);

lox_test!(methods_see_this
  "class Person { describe() { return this.name; } } var p = Person(); p.name = \"Ada\"; print p.describe();"
  "Ada"
);

lox_test!(init_runs_on_construction
  "class Point { init(x, y) { this.x = x; this.y = y; } } var p = Point(1, 2); print p.x + p.y;"
  "3"
);

lox_test!(init_returns_the_instance_when_called_again
  "class Counter { init() { this.n = 0; } } var c = Counter(); print c.init() == c;"
  "true"
);

lox_test!(bare_return_in_init_returns_the_instance
  "class Widget { init() { return; } } print Widget();"
  "<'Widget' object>"
);

lox_test!(bound_methods_remember_their_receiver
  "class Cell { init() { this.value = \"bound\"; } get() { return this.value; } } var method = Cell().get; print method();"
  "bound"
);

lox_test!(bound_methods_print_as_their_function
  "class Cell { get() {} } print Cell().get;"
  "<fn get>"
);

lox_test!(fields_shadow_methods
  "class A { f() { return \"method\"; } } var a = A(); print a.f(); fun g() { return \"field\"; } a.f = g; print a.f();"
  "method"
  "field"
);

lox_test!(inheritance_copies_methods
  "class A { hello() { print \"hi\"; } } class B < A {} B().hello();"
  "hi"
);

lox_test!(subclasses_override_methods
  "class A { f() { return \"A\"; } } class B < A { f() { return \"B\"; } } print B().f();"
  "B"
);

lox_test!(super_calls_the_superclass_method
"
class A { greet() { print \"hi from A\"; } }
class B < A { greet() { super.greet(); print \"hi from B\"; } }
B().greet();
"
  "hi from A"
  "hi from B"
);

lox_test!(super_property_binds_without_calling
  "class A { f() { return \"A\"; } } class B < A { f() { return \"B\"; } g() { var m = super.f; return m(); } } print B().g();"
  "A"
);

lox_test!(inherited_init_runs_for_subclass
  "class A { init(x) { this.x = x; } } class B < A {} print B(5).x;"
  "5"
);

lox_test!(no_init_rejects_arguments
  "class A {} A(1);"
  RuntimeError "Expected 0 arguments but got 1."
);

lox_test!(init_arity_is_checked
  "class P { init(x) { this.x = x; } } P();"
  RuntimeError "Expected 1 arguments but got 0."
);

lox_test!(undefined_property_fails
  "class A {} A().missing;"
  RuntimeError "Undefined property 'missing'."
);

lox_test!(undefined_method_invocation_fails
  "class A {} A().missing();"
  RuntimeError "Undefined property 'missing'."
);

lox_test!(property_access_requires_an_instance
  "var x = 1; x.y;"
  RuntimeError "Only instances have properties."
);

lox_test!(field_assignment_requires_an_instance
  "var x = 1; x.y = 2;"
  RuntimeError "Only instances have fields."
);

lox_test!(method_invocation_requires_an_instance
  "\"text\".length();"
  RuntimeError "Only instances have methods."
);

lox_test!(superclass_must_be_a_class
  "var NotClass = 1; class B < NotClass {}"
  RuntimeError "Superclass must be a class."
);

lox_test!(class_cannot_inherit_from_itself
  "class Loop < Loop {}"
  CompileError "A class can't inherit from itself."
);

lox_test!(this_outside_a_class_is_rejected
  "print this;"
  CompileError "Can't use 'this' outside of a class."
);

lox_test!(super_outside_a_class_is_rejected
  "print super.f;"
  CompileError "Can't use 'super' outside of a class."
);

lox_test!(super_without_a_superclass_is_rejected
  "class A { f() { return super.f(); } }"
  CompileError "Can't use 'super' in a class with no superclass."
);

lox_test!(init_cannot_return_a_value
  "class C { init() { return 1; } }"
  CompileError "Can't return a value from an initializer."
);

lox_test!(methods_can_call_other_methods_through_this
  "class Chain { a() { return this.b(); } b() { return \"end\"; } } print Chain().a();"
  "end"
);

lox_test!(invoke_falls_back_to_closure_fields
  "class Holder {} var h = Holder(); fun shout() { return \"called\"; } h.f = shout; print h.f();"
  "called"
);
