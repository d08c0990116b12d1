//! CSV downloads for the admin area.

use crate::{
    error::ClubError,
    state::db_objects::{DbAlumnus, DbMember, DbRegistration},
};
use axum::{http::header, response::IntoResponse};
use csv_async::AsyncWriterBuilder;

pub const ALUMNI_HEADERS: [&str; 6] = [
    "Full Name",
    "Matric Number",
    "Faculty",
    "Department",
    "WhatsApp Number",
    "Graduation Year",
];
pub const WHATSAPP_HEADERS: [&str; 3] = ["Full Name", "Matric Number", "WhatsApp Number"];
pub const REGISTRATION_HEADERS: [&str; 4] =
    ["Full Name", "Email", "WhatsApp Number", "Registered At"];

pub async fn alumni_csv(alumni: &[DbAlumnus]) -> Result<Vec<u8>, ClubError> {
    let mut buf = vec![];
    {
        let mut asw = AsyncWriterBuilder::new().create_writer(&mut buf);
        asw.write_record(ALUMNI_HEADERS).await?;

        for a in alumni {
            asw.write_record(&[
                a.full_name.clone(),
                a.matric_number.clone(),
                a.faculty_name.clone().unwrap_or_default(),
                a.department_name.clone().unwrap_or_default(),
                a.whatsapp_number.clone().unwrap_or_default(),
                a.graduation_year.to_string(),
            ])
            .await?;
        }

        asw.flush().await.map_err(csv_async::Error::from)?; //flush here to ensure we get the errors
    }

    Ok(buf)
}

///members without a WhatsApp number are skipped
pub async fn whatsapp_csv(members: &[DbMember]) -> Result<Vec<u8>, ClubError> {
    let mut buf = vec![];
    {
        let mut asw = AsyncWriterBuilder::new().create_writer(&mut buf);
        asw.write_record(WHATSAPP_HEADERS).await?;

        for m in members {
            let Some(number) = m.whatsapp_number.as_deref().filter(|n| !n.trim().is_empty())
            else {
                continue;
            };
            asw.write_record([m.full_name.as_str(), m.matric_number.as_str(), number])
                .await?;
        }

        asw.flush().await.map_err(csv_async::Error::from)?;
    }

    Ok(buf)
}

pub async fn registrations_csv(
    registrations: &[DbRegistration],
    date_time_format: &str,
) -> Result<Vec<u8>, ClubError> {
    let mut buf = vec![];
    {
        let mut asw = AsyncWriterBuilder::new().create_writer(&mut buf);
        asw.write_record(REGISTRATION_HEADERS).await?;

        for r in registrations {
            asw.write_record(&[
                r.full_name.clone(),
                r.email.clone().unwrap_or_default(),
                r.whatsapp_number.clone().unwrap_or_default(),
                r.created_at.format(date_time_format).to_string(),
            ])
            .await?;
        }

        asw.flush().await.map_err(csv_async::Error::from)?;
    }

    Ok(buf)
}

pub fn download(content_type: &'static str, filename: &str, body: Vec<u8>) -> impl IntoResponse {
    let disposition = format!("attachment; filename=\"{filename}\"");
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
}

pub fn csv_download(filename: &str, body: Vec<u8>) -> impl IntoResponse {
    download("text/csv; charset=utf-8", filename, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn member(name: &str, number: Option<&str>) -> DbMember {
        DbMember {
            id: 1,
            full_name: name.into(),
            matric_number: "190404012".into(),
            faculty_id: None,
            faculty_name: None,
            department_id: None,
            department_name: None,
            level_of_study: "300".into(),
            whatsapp_number: number.map(ToString::to_string),
            expected_graduation_year: 2026,
            user_id: None,
        }
    }

    #[tokio::test]
    async fn whatsapp_skips_members_without_numbers() {
        let csv = whatsapp_csv(&[
            member("Ada", Some("+2348031234567")),
            member("Bola", None),
            member("Chi", Some("  ")),
        ])
        .await
        .unwrap();
        let csv = String::from_utf8(csv).unwrap();

        assert_eq!(
            csv,
            "Full Name,Matric Number,WhatsApp Number\nAda,190404012,+2348031234567\n"
        );
    }

    #[tokio::test]
    async fn alumni_fields_are_quoted_when_needed() {
        let csv = alumni_csv(&[DbAlumnus {
            id: 1,
            full_name: "Eze, Ngozi".into(),
            matric_number: "ENG/19/0123".into(),
            faculty_name: Some("Engineering".into()),
            department_name: None,
            whatsapp_number: None,
            graduation_year: 2024,
        }])
        .await
        .unwrap();
        let csv = String::from_utf8(csv).unwrap();
        let mut lines = csv.lines();

        assert_eq!(
            lines.next(),
            Some("Full Name,Matric Number,Faculty,Department,WhatsApp Number,Graduation Year")
        );
        assert_eq!(
            lines.next(),
            Some("\"Eze, Ngozi\",ENG/19/0123,Engineering,,,2024")
        );
    }

    #[tokio::test]
    async fn registrations_use_the_configured_format() {
        let csv = registrations_csv(
            &[DbRegistration {
                id: 3,
                event_id: 1,
                full_name: "Tunde".into(),
                email: Some("tunde@example.com".into()),
                whatsapp_number: None,
                created_at: NaiveDate::from_ymd_opt(2024, 9, 1)
                    .unwrap()
                    .and_hms_opt(9, 5, 0)
                    .unwrap(),
            }],
            "%Y-%m-%d %H:%M",
        )
        .await
        .unwrap();

        assert!(String::from_utf8(csv)
            .unwrap()
            .ends_with("Tunde,tunde@example.com,,2024-09-01 09:05\n"));
    }
}
