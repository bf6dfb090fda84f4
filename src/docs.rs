use crate::api::attendance::{CorrectAttendance, SetManualStatus};
use crate::api::lateness::{LateEntry, LateRosterResponse, SetResolution};
use crate::api::location::CreateLocation;
use crate::api::report::{
    DailyReportResponse, DailyRow, DateQuery, EvaluatedDay, MonthlyQuery, MonthlyReportResponse,
    MonthlyRow,
};
use crate::api::shift::{ShiftListResponse, ShiftQuery, UpsertShift};
use crate::api::staff::{CreateStaff, StaffListResponse, StaffQuery};
use crate::auth::handlers::LoginResponse;
use crate::evaluator::{AttendanceStatus, MonthlySummary, Resolution};
use crate::model::{
    attendance::{AttendanceRecord, ManualStatus},
    location::Location,
    shift::Shift,
    staff::Staff,
};
use crate::models::LoginReqDto;
use crate::utils::records::StaffName;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Timecard API",
        version = "1.0.0",
        description = r#"
## Shift attendance and daily pay

Tracks scheduled shifts and clock punches for hourly staff, and derives from them
the day's status, lateness and pay.

### 🔹 Key Features
- **Attendance**
  - Clock in / clock out, administrator corrections and overrides
  - Daily table for all staff, monthly calendar per staff member
- **Lateness**
  - Late arrivals of a day, earliest first, with an unresolved counter
- **Pay**
  - Worked time inside the shift window, floored to 15 minutes, times the hourly rate
- **Shifts, staff and locations**
  - Administrator maintenance of schedules and master data

### 🔐 Security
Endpoints under `/api` require a **JWT Bearer** access token.
Reports across staff and all writes except punching are **Admin** only.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,
        crate::auth::handlers::me,

        crate::api::staff::create_staff,
        crate::api::staff::list_staff,
        crate::api::staff::get_staff,
        crate::api::staff::update_staff,
        crate::api::staff::delete_staff,

        crate::api::location::create_location,
        crate::api::location::list_locations,
        crate::api::location::update_location,
        crate::api::location::delete_location,

        crate::api::shift::upsert_shift,
        crate::api::shift::list_shifts,
        crate::api::shift::delete_shift,

        crate::api::attendance::clock_in,
        crate::api::attendance::clock_out,
        crate::api::attendance::correct_attendance,
        crate::api::attendance::set_manual_status,
        crate::api::report::daily_report,
        crate::api::report::monthly_report,

        crate::api::lateness::late_roster,
        crate::api::lateness::unresolved_count,
        crate::api::lateness::set_resolution
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            Staff,
            StaffName,
            CreateStaff,
            StaffQuery,
            StaffListResponse,
            Location,
            CreateLocation,
            Shift,
            UpsertShift,
            ShiftQuery,
            ShiftListResponse,
            AttendanceRecord,
            ManualStatus,
            AttendanceStatus,
            CorrectAttendance,
            SetManualStatus,
            EvaluatedDay,
            DateQuery,
            DailyRow,
            DailyReportResponse,
            MonthlyQuery,
            MonthlyRow,
            MonthlySummary,
            MonthlyReportResponse,
            Resolution,
            LateEntry,
            LateRosterResponse,
            SetResolution
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login and token rotation"),
        (name = "Staff", description = "Staff management APIs"),
        (name = "Location", description = "Work location APIs"),
        (name = "Shift", description = "Shift schedule APIs"),
        (name = "Attendance", description = "Punches, overrides and attendance tables"),
        (name = "Lateness", description = "Late arrival roster"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme the paths refer to.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route_group() {
        let doc = ApiDoc::openapi();
        for path in [
            "/auth/login",
            "/api/me",
            "/api/staff/{staff_id}",
            "/api/locations",
            "/api/shifts",
            "/api/attendance/daily",
            "/api/attendance/{staff_id}/{date}/status",
            "/api/lateness/unresolved-count",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
    }

    #[test]
    fn declares_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
