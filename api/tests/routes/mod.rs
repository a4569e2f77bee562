mod faculty_sessions_test;
mod student_courses_test;
mod student_scan_test;
mod system_test;
