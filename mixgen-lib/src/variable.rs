//! Independent variables and their effective row counts.

/// Number of independent variables a parameter set carries.
pub const VARIABLE_COUNT: usize = 6;

/// One of the six dimensions mixtures are generated over.
///
/// The declaration order is the order used for cross-product decomposition:
/// targets cycle fastest, elevations slowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variable {
    Targets,
    Interferers,
    Hrtfs,
    Tirs,
    Azimuths,
    Elevations,
}

impl Variable {
    /// All variables in decomposition order.
    pub const ALL: [Variable; VARIABLE_COUNT] = [
        Variable::Targets,
        Variable::Interferers,
        Variable::Hrtfs,
        Variable::Tirs,
        Variable::Azimuths,
        Variable::Elevations,
    ];

    /// Position of this variable in [`Variable::ALL`].
    pub fn position(self) -> usize {
        self as usize
    }

    /// Option name of this variable.
    pub fn name(self) -> &'static str {
        match self {
            Variable::Targets => "targets",
            Variable::Interferers => "interferers",
            Variable::Hrtfs => "hrtfs",
            Variable::Tirs => "tirs",
            Variable::Azimuths => "azimuths",
            Variable::Elevations => "elevations",
        }
    }
}

/// Natural row counts of each variable, in [`Variable::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowCounts {
    natural: [usize; VARIABLE_COUNT],
}

impl RowCounts {
    /// Build from natural counts, where 0 marks an empty variable.
    pub fn new(natural: [usize; VARIABLE_COUNT]) -> Self {
        Self { natural }
    }

    /// Count as stored, 0 for empty variables.
    pub fn natural(&self, variable: Variable) -> usize {
        self.natural[variable.position()]
    }

    /// Effective row count: scalars and empty values count as one row.
    pub fn get(&self, variable: Variable) -> usize {
        self.natural(variable).max(1)
    }

    /// Effective row counts in [`Variable::ALL`] order.
    pub fn clamped(&self) -> [usize; VARIABLE_COUNT] {
        let mut counts = [1; VARIABLE_COUNT];
        for variable in Variable::ALL {
            counts[variable.position()] = self.get(variable);
        }
        counts
    }

    /// Effective counts greater than one, in variable order.
    pub fn non_trivial(&self) -> Vec<usize> {
        self.clamped().into_iter().filter(|&count| count > 1).collect()
    }

    /// Non-trivial variables paired with their effective row counts.
    pub fn non_trivial_variables(&self) -> Vec<(Variable, usize)> {
        Variable::ALL
            .into_iter()
            .map(|variable| (variable, self.get(variable)))
            .filter(|&(_, count)| count > 1)
            .collect()
    }

    /// True when every non-trivial variable has the same row count.
    pub fn equal(&self) -> bool {
        let non_trivial = self.non_trivial();
        match non_trivial.first() {
            Some(first) => non_trivial.iter().all(|count| count == first),
            None => true,
        }
    }

    /// The shared non-trivial row count, or 1 when every variable is scalar.
    ///
    /// Only meaningful when [`RowCounts::equal`] holds.
    pub fn common(&self) -> usize {
        self.non_trivial().first().copied().unwrap_or(1)
    }
}
