//! Role-scoped lesson visibility
//!
//! Every invoice and summary request passes through here before any
//! lesson is loaded. The rule table says which optional filters a role may
//! narrow by; everything else is derived from the caller's linked entity.

use crate::domain::{
    DomainError, DomainResult, Family, LessonQuery, RepositoryProvider, Teacher, User, UserRole,
};
use crate::shared::DateRange;

/// Requesting user reduced to what scoping needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    SuperAdmin,
    /// `supervisor_id` set means the admin only sees that supervisor's tree.
    Admin { supervisor_id: Option<i32> },
    Teacher { teacher_id: i32 },
    Family { family_id: i32 },
}

impl Caller {
    /// Resolve a caller from its account. Teacher and family accounts must
    /// be linked to their profile row.
    pub fn from_user(user: &User) -> DomainResult<Self> {
        if !user.is_active {
            return Err(DomainError::Unauthorized("Account is disabled".into()));
        }
        let unlinked = || {
            DomainError::Forbidden(format!(
                "{} account {} is not linked to a profile",
                user.role, user.id
            ))
        };
        Ok(match user.role {
            UserRole::SuperAdmin => Self::SuperAdmin,
            UserRole::Admin => Self::Admin {
                supervisor_id: user.supervisor_id,
            },
            UserRole::Teacher => Self::Teacher {
                teacher_id: user.teacher_id.ok_or_else(unlinked)?,
            },
            UserRole::Family => Self::Family {
                family_id: user.family_id.ok_or_else(unlinked)?,
            },
        })
    }

    pub fn role(&self) -> UserRole {
        match self {
            Self::SuperAdmin => UserRole::SuperAdmin,
            Self::Admin { .. } => UserRole::Admin,
            Self::Teacher { .. } => UserRole::Teacher,
            Self::Family { .. } => UserRole::Family,
        }
    }

    /// Supervisor the caller is confined to, if any.
    pub fn supervisor_scope(&self) -> Option<i32> {
        match self {
            Self::Admin { supervisor_id } => *supervisor_id,
            _ => None,
        }
    }

    fn kind(&self) -> ScopeKind {
        match self {
            Self::SuperAdmin | Self::Admin { supervisor_id: None } => ScopeKind::Organization,
            Self::Admin { supervisor_id: Some(_) } => ScopeKind::Supervisor,
            Self::Teacher { .. } => ScopeKind::Teacher,
            Self::Family { .. } => ScopeKind::Family,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    Organization,
    Supervisor,
    Teacher,
    Family,
}

struct VisibilityRule {
    teacher_filter: bool,
    family_filter: bool,
}

/// Filters each scope may apply, indexed by [`rule_for`].
const VISIBILITY: [VisibilityRule; 4] = [
    // Organization
    VisibilityRule { teacher_filter: true, family_filter: true },
    // Supervisor
    VisibilityRule { teacher_filter: true, family_filter: true },
    // Teacher
    VisibilityRule { teacher_filter: false, family_filter: true },
    // Family
    VisibilityRule { teacher_filter: false, family_filter: false },
];

fn rule_for(kind: ScopeKind) -> &'static VisibilityRule {
    match kind {
        ScopeKind::Organization => &VISIBILITY[0],
        ScopeKind::Supervisor => &VISIBILITY[1],
        ScopeKind::Teacher => &VISIBILITY[2],
        ScopeKind::Family => &VISIBILITY[3],
    }
}

/// Optional narrowing requested by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SummaryFilters {
    pub teacher_id: Option<i32>,
    pub family_id: Option<i32>,
}

/// Ownership facts needed to authorize a lesson write.
#[derive(Debug, Clone, Copy)]
pub struct LessonOwners {
    pub teacher_id: i32,
    pub teacher_supervisor: Option<i32>,
    pub family_supervisor: Option<i32>,
}

/// Resolves what a caller may see.
pub struct RoleScopedQuery<'a> {
    repos: &'a dyn RepositoryProvider,
}

impl<'a> RoleScopedQuery<'a> {
    pub fn new(repos: &'a dyn RepositoryProvider) -> Self {
        Self { repos }
    }

    /// Lesson query for a summary request: the caller's default lesson set
    /// narrowed by whichever filters the rule table allows.
    pub async fn lesson_query(
        &self,
        caller: &Caller,
        range: DateRange,
        filters: SummaryFilters,
    ) -> DomainResult<LessonQuery> {
        let rule = rule_for(caller.kind());
        let filters = drop_self_filters(caller, filters);

        if filters.teacher_id.is_some() && !rule.teacher_filter {
            return Err(DomainError::Forbidden(format!(
                "{} callers cannot filter by teacher",
                caller.role()
            )));
        }
        if filters.family_id.is_some() && !rule.family_filter {
            return Err(DomainError::Forbidden(format!(
                "{} callers cannot filter by family",
                caller.role()
            )));
        }

        // Filters must name existing entities inside the caller's scope.
        if let Some(id) = filters.teacher_id {
            let teacher = self.teacher(id).await?;
            self.authorize_teacher(caller, &teacher)?;
        }
        if let Some(id) = filters.family_id {
            let family = self.family(id).await?;
            self.check_family_in_supervisor_scope(caller, &family)?;
        }

        let mut query = LessonQuery::new(range);
        match *caller {
            Caller::Teacher { teacher_id } => query = query.teachers(vec![teacher_id]),
            Caller::Family { family_id } => query = query.families(vec![family_id]),
            Caller::Admin { supervisor_id: Some(supervisor_id) }
                if filters.teacher_id.is_none() && filters.family_id.is_none() =>
            {
                let (teachers, families) = self.supervisor_tree(supervisor_id).await?;
                query = query.teachers(teachers).families(families).match_any_owner();
            }
            _ => {}
        }
        if let Some(id) = filters.teacher_id {
            query = query.teachers(vec![id]);
        }
        if let Some(id) = filters.family_id {
            query = query.families(vec![id]);
        }
        Ok(query)
    }

    pub fn authorize_family(&self, caller: &Caller, family: &Family) -> DomainResult<()> {
        match *caller {
            Caller::Family { family_id } if family_id == family.id => Ok(()),
            Caller::Family { .. } | Caller::Teacher { .. } => {
                Err(forbidden("family invoice", family.id))
            }
            _ => self.check_family_in_supervisor_scope(caller, family),
        }
    }

    pub fn authorize_teacher(&self, caller: &Caller, teacher: &Teacher) -> DomainResult<()> {
        match *caller {
            Caller::Teacher { teacher_id } if teacher_id == teacher.id => Ok(()),
            Caller::Teacher { .. } | Caller::Family { .. } => {
                Err(forbidden("teacher", teacher.id))
            }
            Caller::Admin { supervisor_id: Some(scope) } if teacher.supervisor_id != Some(scope) => {
                Err(forbidden("teacher", teacher.id))
            }
            _ => Ok(()),
        }
    }

    pub fn authorize_supervisor(&self, caller: &Caller, supervisor_id: i32) -> DomainResult<()> {
        match *caller {
            Caller::SuperAdmin | Caller::Admin { supervisor_id: None } => Ok(()),
            Caller::Admin { supervisor_id: Some(scope) } if scope == supervisor_id => Ok(()),
            _ => Err(forbidden("supervisor", supervisor_id)),
        }
    }

    /// Supervisor filter to apply to an "all invoices" listing. Scoped
    /// admins are pinned to their own supervisor.
    pub fn listing_scope(&self, caller: &Caller, requested: Option<i32>) -> DomainResult<Option<i32>> {
        match *caller {
            Caller::SuperAdmin | Caller::Admin { supervisor_id: None } => Ok(requested),
            Caller::Admin { supervisor_id: Some(scope) } => match requested {
                Some(id) if id != scope => Err(forbidden("supervisor", id)),
                _ => Ok(Some(scope)),
            },
            Caller::Teacher { .. } | Caller::Family { .. } => Err(DomainError::Forbidden(
                format!("{} callers cannot list invoices", caller.role()),
            )),
        }
    }

    /// Who may record or change a lesson: admins within scope and the
    /// lesson's own teacher. Families never write.
    pub fn authorize_lesson_write(&self, caller: &Caller, owners: &LessonOwners) -> DomainResult<()> {
        match *caller {
            Caller::SuperAdmin | Caller::Admin { supervisor_id: None } => Ok(()),
            Caller::Admin { supervisor_id: Some(scope) }
                if owners.teacher_supervisor == Some(scope)
                    || owners.family_supervisor == Some(scope) =>
            {
                Ok(())
            }
            Caller::Teacher { teacher_id } if teacher_id == owners.teacher_id => Ok(()),
            _ => Err(DomainError::Forbidden(format!(
                "{} callers cannot change lessons of teacher {}",
                caller.role(),
                owners.teacher_id
            ))),
        }
    }

    fn check_family_in_supervisor_scope(&self, caller: &Caller, family: &Family) -> DomainResult<()> {
        match caller.supervisor_scope() {
            Some(scope) if family.supervisor_id != Some(scope) => {
                Err(forbidden("family", family.id))
            }
            _ => Ok(()),
        }
    }

    async fn teacher(&self, id: i32) -> DomainResult<Teacher> {
        self.repos
            .teachers()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Teacher", id))
    }

    async fn family(&self, id: i32) -> DomainResult<Family> {
        self.repos
            .families()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Family", id))
    }

    async fn supervisor_tree(&self, supervisor_id: i32) -> DomainResult<(Vec<i32>, Vec<i32>)> {
        let teachers = self.repos.teachers().find_by_supervisor(supervisor_id).await?;
        let families = self.repos.families().find_by_supervisor(supervisor_id).await?;
        Ok((
            teachers.into_iter().map(|t| t.id).collect(),
            families.into_iter().map(|f| f.id).collect(),
        ))
    }
}

/// A teacher or family filtering by its own id is a no-op.
fn drop_self_filters(caller: &Caller, mut filters: SummaryFilters) -> SummaryFilters {
    match *caller {
        Caller::Teacher { teacher_id } if filters.teacher_id == Some(teacher_id) => {
            filters.teacher_id = None;
        }
        Caller::Family { family_id } if filters.family_id == Some(family_id) => {
            filters.family_id = None;
        }
        _ => {}
    }
    filters
}

fn forbidden(what: &str, id: i32) -> DomainError {
    DomainError::Forbidden(format!("{} {} is outside the caller's scope", what, id))
}
