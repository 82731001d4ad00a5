//! HTML shells for the admin panel. The real UI is a separate frontend bundle;
//! these pages only give the gate something to redirect to and to protect.

use axum::response::Html;

const LOGIN_PAGE: &str = r#"<!doctype html>
<html lang="vi">
<head>
  <meta charset="utf-8">
  <title>Đăng nhập quản trị</title>
</head>
<body>
  <form id="login">
    <input name="email" type="email" placeholder="Email" required>
    <input name="password" type="password" placeholder="Mật khẩu" required>
    <label><input name="remember" type="checkbox"> Ghi nhớ đăng nhập</label>
    <button type="submit">Đăng nhập</button>
    <p id="error" role="alert"></p>
  </form>
  <script>
    const form = document.getElementById("login");
    const remembered = document.cookie.split("; ").find((c) => c.startsWith("remember-email="));
    if (remembered) {
      form.email.value = decodeURIComponent(remembered.split("=")[1]);
      form.remember.checked = true;
    }
    form.addEventListener("submit", async (event) => {
      event.preventDefault();
      const res = await fetch("/api/auth/login", {
        method: "POST",
        headers: { "Content-Type": "application/json" },
        body: JSON.stringify({
          email: form.email.value,
          password: form.password.value,
          remember: form.remember.checked,
        }),
      });
      if (!res.ok) {
        document.getElementById("error").textContent = (await res.json()).error;
        return;
      }
      const target = new URLSearchParams(location.search).get("callbackUrl");
      location.href = target && target.startsWith("/") && !target.startsWith("//") ? target : "/admin";
    });
  </script>
</body>
</html>
"#;

const ADMIN_SHELL: &str = r#"<!doctype html>
<html lang="vi">
<head>
  <meta charset="utf-8">
  <title>Quản trị</title>
</head>
<body>
  <div id="app"></div>
  <button id="logout">Đăng xuất</button>
  <script>
    document.getElementById("logout").addEventListener("click", async () => {
      await fetch("/api/auth/logout", { method: "POST" });
      location.href = "/admin/login";
    });
  </script>
</body>
</html>
"#;

pub async fn login_page() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}

/// Served for `/admin` and every path below it once the gate has let the request through.
pub async fn admin_shell() -> Html<&'static str> {
    Html(ADMIN_SHELL)
}
