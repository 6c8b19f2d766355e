//! Built-in classes of a type-checking session.
//!
//! Every [`TypeInterner`](crate::TypeInterner) declares its own copy of the
//! root hierarchy when it is created. Nothing here is global: two sessions
//! have two distinct `Any` constructors.
//!
//! ```text
//! Any
//! ├── Number ─────── Int, Long, Short, Byte, Double, Float
//! ├── Comparable<in T>
//! │     ├── Int, Long, Short, Byte, Double, Float   (Comparable<Self>)
//! │     └── Boolean, String                         (Comparable<Self>)
//! ├── CharSequence ── String
//! ├── Char
//! └── Unit
//! Nothing   (bottom, no supertypes)
//! ```

use crate::constructors::{ConstructorInfo, ConstructorStore};
use crate::intern::TypeTable;
use crate::types::{ConstructorId, TypeData, TypeId, TypeProjection};
use crate::variance::Variance;
use ktz_common::interner::ShardedInterner;

/// Constructors and frequently used types of the built-in classes.
#[derive(Clone, Debug)]
pub struct BuiltIns {
    pub any: ConstructorId,
    pub nothing: ConstructorId,
    pub number: ConstructorId,
    pub comparable: ConstructorId,
    pub char_sequence: ConstructorId,
    pub int: ConstructorId,
    pub long: ConstructorId,
    pub short: ConstructorId,
    pub byte: ConstructorId,
    pub double: ConstructorId,
    pub float: ConstructorId,
    pub char: ConstructorId,
    pub boolean: ConstructorId,
    pub string: ConstructorId,
    pub unit: ConstructorId,
    /// Shared constructor of every error type.
    pub error: ConstructorId,

    pub any_type: TypeId,
    pub nullable_any: TypeId,
    pub nothing_type: TypeId,
    pub nullable_nothing: TypeId,
    pub number_type: TypeId,
    pub char_sequence_type: TypeId,
    pub int_type: TypeId,
    pub long_type: TypeId,
    pub short_type: TypeId,
    pub byte_type: TypeId,
    pub double_type: TypeId,
    pub float_type: TypeId,
    pub char_type: TypeId,
    pub boolean_type: TypeId,
    pub string_type: TypeId,
    pub unit_type: TypeId,
}

struct Declarer<'a> {
    types: &'a TypeTable,
    strings: &'a ShardedInterner,
    store: &'a ConstructorStore,
}

impl Declarer<'_> {
    fn class(&self, name: &str, sealed: bool) -> ConstructorId {
        self.store
            .register(ConstructorInfo::class(self.strings.intern(name), sealed))
    }

    fn plain(&self, constructor: ConstructorId, nullable: bool) -> TypeId {
        self.types
            .intern(TypeData::simple(constructor, std::iter::empty(), nullable))
    }

    fn applied(&self, constructor: ConstructorId, argument: TypeId) -> TypeId {
        self.types.intern(TypeData::simple(
            constructor,
            [TypeProjection::invariant(argument)],
            false,
        ))
    }
}

impl BuiltIns {
    /// Declare the built-in hierarchy into a fresh store.
    pub(crate) fn declare(
        types: &TypeTable,
        strings: &ShardedInterner,
        store: &ConstructorStore,
    ) -> Self {
        let d = Declarer {
            types,
            strings,
            store,
        };

        let any = d.class("Any", false);
        let nothing = d.class("Nothing", true);
        let any_type = d.plain(any, false);
        let nullable_any = d.plain(any, true);

        let comparable = store.register(ConstructorInfo::interface(strings.intern("Comparable")));
        let comparable_t = store.register(
            ConstructorInfo::type_parameter(strings.intern("T"), Variance::In, comparable, 0)
                .with_supertypes(vec![nullable_any]),
        );
        store.set_parameters(comparable, vec![comparable_t]);
        store.set_supertypes(comparable, vec![any_type]);

        let number = d.class("Number", false);
        store.set_supertypes(number, vec![any_type]);
        let number_type = d.plain(number, false);

        let char_sequence = store.register(ConstructorInfo::interface(strings.intern("CharSequence")));
        store.set_supertypes(char_sequence, vec![any_type]);
        let char_sequence_type = d.plain(char_sequence, false);

        let numeric = |name: &str| {
            let c = d.class(name, true);
            let ty = d.plain(c, false);
            store.set_supertypes(c, vec![number_type, d.applied(comparable, ty)]);
            (c, ty)
        };
        let (int, int_type) = numeric("Int");
        let (long, long_type) = numeric("Long");
        let (short, short_type) = numeric("Short");
        let (byte, byte_type) = numeric("Byte");
        let (double, double_type) = numeric("Double");
        let (float, float_type) = numeric("Float");

        let comparable_only = |name: &str| {
            let c = d.class(name, true);
            let ty = d.plain(c, false);
            store.set_supertypes(c, vec![d.applied(comparable, ty)]);
            (c, ty)
        };
        let char = d.class("Char", true);
        store.set_supertypes(char, vec![any_type]);
        let char_type = d.plain(char, false);
        let (boolean, boolean_type) = comparable_only("Boolean");
        let (string, string_type) = comparable_only("String");
        let string_comparable = d.applied(comparable, string_type);
        store.set_supertypes(string, vec![string_comparable, char_sequence_type]);

        let unit = d.class("Unit", true);
        store.set_supertypes(unit, vec![any_type]);
        let unit_type = d.plain(unit, false);

        let error = store.register(ConstructorInfo::error(strings.intern("[ERROR]")));

        BuiltIns {
            any,
            nothing,
            number,
            comparable,
            char_sequence,
            int,
            long,
            short,
            byte,
            double,
            float,
            char,
            boolean,
            string,
            unit,
            error,
            any_type,
            nullable_any,
            nothing_type: d.plain(nothing, false),
            nullable_nothing: d.plain(nothing, true),
            number_type,
            char_sequence_type,
            int_type,
            long_type,
            short_type,
            byte_type,
            double_type,
            float_type,
            char_type,
            boolean_type,
            string_type,
            unit_type,
        }
    }

    /// `Any` or `Any?`.
    pub fn any(&self, nullable: bool) -> TypeId {
        if nullable { self.nullable_any } else { self.any_type }
    }

    /// `Nothing` or `Nothing?`.
    pub fn nothing(&self, nullable: bool) -> TypeId {
        if nullable {
            self.nullable_nothing
        } else {
            self.nothing_type
        }
    }

    /// Look up a built-in class by its source name.
    pub fn by_name(&self, name: &str) -> Option<ConstructorId> {
        Some(match name {
            "Any" => self.any,
            "Nothing" => self.nothing,
            "Number" => self.number,
            "Comparable" => self.comparable,
            "CharSequence" => self.char_sequence,
            "Int" => self.int,
            "Long" => self.long,
            "Short" => self.short,
            "Byte" => self.byte,
            "Double" => self.double,
            "Float" => self.float,
            "Char" => self.char,
            "Boolean" => self.boolean,
            "String" => self.string,
            "Unit" => self.unit,
            _ => return None,
        })
    }
}
