use uuid::Uuid;

/// Organizational attribution stamped onto records an owner creates.
///
/// Opaque to the scheduling core: the ids are passed through unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Attribution {
    pub department_id: Option<Uuid>,
    pub office_id: Option<Uuid>,
    pub division_id: Option<Uuid>,
}

/// The caller on whose behalf an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Owner {
    pub id: Uuid,
    pub attribution: Attribution,
}

impl Owner {
    #[must_use]
    pub const fn new(id: Uuid) -> Self {
        Self {
            id,
            attribution: Attribution {
                department_id: None,
                office_id: None,
                division_id: None,
            },
        }
    }

    #[must_use]
    pub const fn with_attribution(mut self, attribution: Attribution) -> Self {
        self.attribution = attribution;
        self
    }
}

impl std::fmt::Display for Owner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}
