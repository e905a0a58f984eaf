//! Team sheet normalization.

use tracing::{debug, info, instrument};

use super::schema::{TEAM, TeamField};
use super::{parse_table, split_multi};
use crate::error::Result;
use crate::models::{ResourceClass, TeamMemberRecord};

/// Parse the team CSV into members, in sheet order. Rows without roles are
/// dropped.
#[instrument(level = "info", skip_all, fields(bytes = input.as_ref().len()))]
pub fn parse_team(input: impl AsRef<[u8]>) -> Result<Vec<TeamMemberRecord>> {
    let rows = parse_table(ResourceClass::Team, input)?;
    let total = rows.len();

    let members: Vec<TeamMemberRecord> = rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let roles = split_multi(TEAM.value(row, TeamField::Roles).unwrap_or_default());
            if roles.is_empty() {
                debug!(row = i + 2, "Skipping team row without roles");
                return None;
            }
            Some(TeamMemberRecord {
                name: TEAM.value(row, TeamField::Name).unwrap_or_default().to_string(),
                roles,
                description: TEAM
                    .value(row, TeamField::Description)
                    .unwrap_or_default()
                    .to_string(),
                interests: split_multi(TEAM.value(row, TeamField::Interests).unwrap_or_default()),
                image_url: TEAM.value(row, TeamField::Image).map(str::to_string),
            })
        })
        .collect();

    info!(rows = total, kept = members.len(), "Normalized team");
    Ok(members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TeamView, members_in_view};

    const CSV: &str = "Nombre,Rol,Descripción,Áreas de interés,Imagen\n\
        José Pérez,Editor; Autor,Estudiante de física,\"Óptica, Astronomía\",https://img.example/jp.png\n\
        Ana Ruiz,Autor,Autora invitada,Química,\n\
        Sin Rol,,Nada,,\n";

    #[test]
    fn members_without_roles_are_dropped() {
        let members = parse_team(CSV).unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].roles, vec!["Editor", "Autor"]);
        assert_eq!(members[0].interests, vec!["Óptica", "Astronomía"]);
        assert_eq!(members[0].image_url.as_deref(), Some("https://img.example/jp.png"));
        assert_eq!(members[1].image_url, None);
    }

    #[test]
    fn author_only_row_lands_in_authors_view_only() {
        let members = parse_team(CSV).unwrap();
        let team: Vec<_> = members_in_view(&members, TeamView::Team)
            .iter()
            .map(|m| m.name.clone())
            .collect();
        let authors: Vec<_> = members_in_view(&members, TeamView::Authors)
            .iter()
            .map(|m| m.name.clone())
            .collect();
        assert_eq!(team, vec!["José Pérez"]);
        assert_eq!(authors, vec!["José Pérez", "Ana Ruiz"]);
    }
}
